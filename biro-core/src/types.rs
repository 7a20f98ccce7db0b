//! The closed type system of the biro language.
//!
//! Three scalar types and nine containers (`a`, `q`, `s` over each
//! scalar). Containers never nest, so every declarable type is one of the
//! twelve values returned by [`Type::all`].

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Num,
    Str,
    Bool,
}

/// Container flavour chosen by the `a[...]`, `q[...]` and `s[...]` markers.
///
/// Queues pop from the front and stacks from the back; that difference
/// lives entirely in the native container type picked for each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Queue,
    Stack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Scalar(ScalarType),
    Container(ContainerKind, ScalarType),
}

impl ScalarType {
    pub const ALL: [ScalarType; 3] = [ScalarType::Num, ScalarType::Str, ScalarType::Bool];

    pub fn cpp_name(self) -> &'static str {
        match self {
            ScalarType::Num => "float",
            ScalarType::Str => "std::string",
            ScalarType::Bool => "bool",
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ScalarType::Num => "num",
            ScalarType::Str => "str",
            ScalarType::Bool => "bool",
        }
    }
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 3] =
        [ContainerKind::Array, ContainerKind::Queue, ContainerKind::Stack];

    /// The literal marker letter (`a`, `q`, `s`).
    pub fn marker(self) -> char {
        match self {
            ContainerKind::Array => 'a',
            ContainerKind::Queue => 'q',
            ContainerKind::Stack => 's',
        }
    }

    /// Member function that appends one literal element.
    pub fn insert_method(self) -> &'static str {
        match self {
            ContainerKind::Array => "push_back",
            ContainerKind::Queue | ContainerKind::Stack => "push",
        }
    }
}

impl Type {
    pub const NUM: Type = Type::Scalar(ScalarType::Num);
    pub const STR: Type = Type::Scalar(ScalarType::Str);
    pub const BOOL: Type = Type::Scalar(ScalarType::Bool);

    /// Every type a program can declare.
    pub fn all() -> impl Iterator<Item = Type> {
        let scalars = ScalarType::ALL.into_iter().map(Type::Scalar);
        let containers = ContainerKind::ALL.into_iter().flat_map(|kind| {
            ScalarType::ALL
                .into_iter()
                .map(move |element| Type::Container(kind, element))
        });
        scalars.chain(containers)
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Type::Container(kind, _) => Some(*kind),
            Type::Scalar(_) => None,
        }
    }

    /// Native C++ spelling of the type.
    pub fn cpp_name(&self) -> String {
        match self {
            Type::Scalar(scalar) => scalar.cpp_name().to_string(),
            Type::Container(kind, element) => {
                let template = match kind {
                    ContainerKind::Array => "std::vector",
                    ContainerKind::Queue => "std::queue",
                    ContainerKind::Stack => "std::stack",
                };
                format!("{template}<{}>", element.cpp_name())
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(scalar) => f.write_str(scalar.keyword()),
            Type::Container(kind, element) => {
                write!(f, "{}[{}]", kind.marker(), element.keyword())
            }
        }
    }
}
