//! Syntax tree produced by the parser.
//!
//! The tree is built once per compilation and only read afterwards: the
//! declaration pass in [`crate::program`] and the C++ generator both
//! traverse it by reference.

use crate::types::{ContainerKind, Type};

/// Where a variable declaration registers its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `biro`: hoisted into the program-wide global table.
    Global,
    /// `smallbiro`: declared in place.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Equals,
    More,
    Less,
    And,
    Or,
}

impl BinaryOp {
    /// Native spelling of the operator.
    pub fn cpp_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Equals => "==",
            BinaryOp::More => ">",
            BinaryOp::Less => "<",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Equals | BinaryOp::More | BinaryOp::Less)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    /// Text between the quotes, no escape processing.
    Str(String),
    Bool(bool),
}

/// `name(args)`; shared by plain and builtin calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call(Call),
    /// `biro.name(args)`
    Builtin(Call),
    /// `a[...]`, `q[...]`, `s[...]`
    Container {
        kind: ContainerKind,
        elements: Vec<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    /// `None` for functions declared with as many types as arguments.
    pub return_type: Option<Type>,
    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|param| param.ty).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl {
        scope: Scope,
        name: String,
        ty: Type,
        value: Expr,
    },
    Assign {
        name: String,
        value: Expr,
    },
    Call(Call),
    Builtin(Call),
    Function(FunctionDecl),
    /// `biro attempt { ... }`
    Try(Vec<Stmt>),
    /// `biro arrest { ... }`
    Catch(Vec<Stmt>),
    /// `biro loop { ... }`
    Loop(Vec<Stmt>),
    /// `biro is cond ? { ... }`
    If {
        condition: Expr,
        body: Vec<Stmt>,
    },
    /// `donate expr`; only inside function, loop and conditional bodies.
    Donate(Expr),
    /// `leave`; only inside loop and conditional bodies.
    Leave,
    /// `proceed`; only inside loop and conditional bodies.
    Proceed,
}
