//! The intermediate program: global table, function table and entry body.
//!
//! Built from the parsed statements by a separate declaration pass so the
//! parser itself stays free of side effects. Both tables keep the order in
//! which declarations appear in the source; the generator emits them in
//! that order.

use crate::ast::{Expr, FunctionDecl, Scope, Stmt};
use crate::error::CoreError;
use crate::types::Type;

/// Key of the function table. Functions may share a name as long as their
/// parameter types differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub param_names: Vec<String>,
    pub return_type: Option<Type>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub header: String,
    globals: Vec<(String, Type)>,
    functions: Vec<(FunctionSignature, FunctionDef)>,
    statements: Vec<Stmt>,
}

pub fn default_header() -> String {
    format!(
        " Generated by the biro compiler v{}.\n Do not edit by hand.",
        env!("CARGO_PKG_VERSION")
    )
}

impl Program {
    /// Run the declaration pass over a parsed translation unit.
    ///
    /// Nested bodies are walked in source order; a function's own body is
    /// walked before the function is registered, so a function declared
    /// inside another one lands in the table first.
    pub fn collect(statements: Vec<Stmt>) -> Result<Program, CoreError> {
        let mut program = Program {
            header: default_header(),
            globals: Vec::new(),
            functions: Vec::new(),
            statements: Vec::new(),
        };
        program.visit(&statements)?;
        program.statements = statements;
        log::debug!(
            "collected {} global(s) and {} function(s)",
            program.globals.len(),
            program.functions.len()
        );
        Ok(program)
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn globals(&self) -> &[(String, Type)] {
        &self.globals
    }

    pub fn global(&self, name: &str) -> Option<Type> {
        self.globals
            .iter()
            .find_map(|(global, ty)| (global == name).then_some(*ty))
    }

    pub fn functions(&self) -> &[(FunctionSignature, FunctionDef)] {
        &self.functions
    }

    pub fn function(&self, signature: &FunctionSignature) -> Option<&FunctionDef> {
        self.functions
            .iter()
            .find_map(|(key, def)| (key == signature).then_some(def))
    }

    /// Top-level statements, the body of the program entry point.
    pub fn statements(&self) -> &[Stmt] {
        &self.statements
    }

    fn visit(&mut self, statements: &[Stmt]) -> Result<(), CoreError> {
        for statement in statements {
            match statement {
                Stmt::VarDecl {
                    scope,
                    name,
                    ty,
                    value,
                } => {
                    check_container_literal(name, ty, value)?;
                    if *scope == Scope::Global {
                        self.register_global(name, *ty)?;
                    }
                }
                Stmt::Function(function) => {
                    self.visit(&function.body)?;
                    self.register_function(function)?;
                }
                Stmt::Try(body) | Stmt::Catch(body) | Stmt::Loop(body) => self.visit(body)?,
                Stmt::If { body, .. } => self.visit(body)?,
                Stmt::Assign { .. }
                | Stmt::Call(_)
                | Stmt::Builtin(_)
                | Stmt::Donate(_)
                | Stmt::Leave
                | Stmt::Proceed => {}
            }
        }
        Ok(())
    }

    fn register_global(&mut self, name: &str, ty: Type) -> Result<(), CoreError> {
        if let Some(existing) = self.global(name) {
            return Err(CoreError::SemanticError(format!(
                "global '{name}' is already declared as {existing}"
            )));
        }
        self.globals.push((name.to_string(), ty));
        Ok(())
    }

    fn register_function(&mut self, function: &FunctionDecl) -> Result<(), CoreError> {
        let signature = FunctionSignature {
            name: function.name.clone(),
            params: function.param_types(),
        };
        if self.function(&signature).is_some() {
            let params: Vec<String> = signature.params.iter().map(Type::to_string).collect();
            return Err(CoreError::SemanticError(format!(
                "function {}({}) is already declared",
                signature.name,
                params.join(", ")
            )));
        }
        let def = FunctionDef {
            param_names: function.params.iter().map(|p| p.name.clone()).collect(),
            return_type: function.return_type,
            body: function.body.clone(),
        };
        self.functions.push((signature, def));
        Ok(())
    }
}

/// A container literal initializes only a container of the same kind.
fn check_container_literal(name: &str, ty: &Type, value: &Expr) -> Result<(), CoreError> {
    let Expr::Container { kind, .. } = value else {
        return Ok(());
    };
    if ty.container_kind() == Some(*kind) {
        return Ok(());
    }
    Err(CoreError::SemanticError(format!(
        "'{name}' is declared as {ty} but initialized with a {}[...] literal",
        kind.marker()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::types::{ContainerKind, ScalarType};

    fn collect(source: &str) -> Result<Program, CoreError> {
        Program::collect(parse(source).expect("parse").statements)
    }

    #[test]
    fn registers_globals_in_source_order() {
        let program = collect(
            "biro b : str = \"x\"\nsmallbiro tmp : num = 1\nbiro a : num = 5\nbiro z : s[bool] = s[true]",
        )
        .expect("collect");
        let names: Vec<&str> = program.globals().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "z"]);
        assert_eq!(program.global("a"), Some(Type::NUM));
        assert_eq!(program.global("tmp"), None);
        assert_eq!(
            program.global("z"),
            Some(Type::Container(ContainerKind::Stack, ScalarType::Bool))
        );
        assert_eq!(program.statements().len(), 4);
    }

    #[test]
    fn registers_globals_declared_inside_bodies() {
        let program = collect("biro loop { biro count : num = 0 leave }").expect("collect");
        assert_eq!(program.global("count"), Some(Type::NUM));
    }

    #[test]
    fn rejects_duplicate_globals() {
        let err = collect("biro x : num = 1\nbiro x : str = \"a\"").unwrap_err();
        assert!(matches!(err, CoreError::SemanticError(message) if message.contains("'x'")));
    }

    #[test]
    fn overloads_by_parameter_types() {
        let program = collect(
            "biro show (v) : (num) { biro.say(v) }\nbiro show (v) : (str) { biro.say(v) }",
        )
        .expect("collect");
        assert_eq!(program.functions().len(), 2);
        let by_str = FunctionSignature {
            name: "show".to_string(),
            params: vec![Type::STR],
        };
        assert_eq!(
            program.function(&by_str).map(|def| def.param_names.clone()),
            Some(vec!["v".to_string()])
        );
    }

    #[test]
    fn rejects_duplicate_signatures() {
        let err = collect(
            "biro f (a) : (num) { }\nbiro f (b) : (num, str) { donate \"x\" }",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::SemanticError(message) if message.contains("f(num)")));
    }

    #[test]
    fn nested_functions_register_before_their_parent() {
        let program =
            collect("biro outer () : () { biro inner () : () { } }").expect("collect");
        let names: Vec<&str> = program
            .functions()
            .iter()
            .map(|(sig, _)| sig.name.as_str())
            .collect();
        assert_eq!(names, vec!["inner", "outer"]);
    }

    #[test]
    fn container_literal_must_match_declared_kind() {
        let err = collect("biro xs : a[num] = q[1, 2]").unwrap_err();
        assert!(matches!(err, CoreError::SemanticError(_)));
        let err = collect("smallbiro n : num = a[1]").unwrap_err();
        assert!(matches!(err, CoreError::SemanticError(_)));
    }

    #[test]
    fn header_defaults_to_banner() {
        let program = collect("").expect("collect");
        assert!(program.header.contains("biro compiler"));
        let program = program.with_header("custom");
        assert_eq!(program.header, "custom");
    }
}
