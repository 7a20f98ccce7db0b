//! The four builtin operations reachable through `biro.name(...)`.
//!
//! Their native implementations are not generated: each one is a C++
//! template file copied verbatim into the `builtins` namespace of the
//! emitted program (see [`crate::templates`]).

/// Namespace that wraps the builtin implementations in emitted code.
pub const NAMESPACE: &str = "builtins";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    /// Print one or more values.
    Say,
    /// Read a line from standard input.
    Ask,
    /// Read (or replace) an array element by numeric index.
    Index,
    /// Number of elements in a container.
    Len,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinDescriptor {
    /// Name at the biro level (`biro.say`).
    pub name: &'static str,
    /// File name of the implementation inside the template root.
    pub template: &'static str,
    pub kind: BuiltinKind,
}

/// The complete builtin table, in emission order.
pub const BUILTINS: &[BuiltinDescriptor] = &[
    BuiltinDescriptor {
        name: "say",
        template: "builtin_say.cpp",
        kind: BuiltinKind::Say,
    },
    BuiltinDescriptor {
        name: "ask",
        template: "builtin_ask.cpp",
        kind: BuiltinKind::Ask,
    },
    BuiltinDescriptor {
        name: "index",
        template: "builtin_index.cpp",
        kind: BuiltinKind::Index,
    },
    BuiltinDescriptor {
        name: "len",
        template: "builtin_len.cpp",
        kind: BuiltinKind::Len,
    },
];

/// Look up a builtin by its biro-level name.
pub fn find_builtin(name: &str) -> Option<&'static BuiltinDescriptor> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}
