//! C++ backend.
//!
//! Lowers a collected [`Program`] into one C++17 translation unit:
//!
//! 1. the program header as `//` comments
//! 2. the runtime includes
//! 3. `namespace builtins { ... }` with the four template sources
//! 4. one declaration per global
//! 5. every function of the function table
//! 6. `int main()` wrapping the top-level statements

use crate::ast::{Call, Expr, Literal, Scope, Stmt};
use crate::builtins::{self, find_builtin};
use crate::error::CoreError;
use crate::program::Program;
use crate::templates::BuiltinTemplates;
use crate::types::{ContainerKind, Type};

const COMMENT_MARK: &str = "//";
const INDENT: &str = "    ";
const INCLUDES: &[&str] = &[
    "iostream",
    "string",
    "vector",
    "queue",
    "stack",
    "cmath",
    "stdexcept",
    "type_traits",
];

/// Generate the C++ source for `program`.
pub fn generate_cpp(program: &Program, templates: &BuiltinTemplates) -> Result<String, CoreError> {
    let mut generator = CppGenerator::new();
    generator.emit_program(program, templates)?;
    log::debug!("generated {} bytes of C++", generator.output.len());
    Ok(generator.output)
}

/// Statement context; decides which control keywords have a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Entry point, `try` and `catch` bodies.
    Plain,
    /// Function bodies: `donate`.
    Function,
    /// Loop and conditional bodies: `donate`, `leave`, `proceed`.
    ControlFlow,
}

struct CppGenerator {
    output: String,
    indent: usize,
}

impl CppGenerator {
    fn new() -> Self {
        CppGenerator {
            output: String::new(),
            indent: 0,
        }
    }

    fn emit_program(&mut self, program: &Program, templates: &BuiltinTemplates) -> Result<(), CoreError> {
        for line in program.header.split('\n') {
            self.line(&format!("{COMMENT_MARK}{line}"));
        }
        self.blank();

        for include in INCLUDES {
            self.line(&format!("#include <{include}>"));
        }
        self.blank();

        self.line(&format!("namespace {} {{", builtins::NAMESPACE));
        for builtin in builtins::BUILTINS {
            let source = templates.get(builtin.kind);
            self.output.push_str(source.trim_end());
            self.output.push('\n');
            self.blank();
        }
        self.line("}");
        self.blank();

        if !program.globals().is_empty() {
            for (name, ty) in program.globals() {
                self.line(&format!("{} {name};", ty.cpp_name()));
            }
            self.blank();
        }

        for (signature, def) in program.functions() {
            let return_type = def
                .return_type
                .map_or_else(|| "void".to_string(), |ty| ty.cpp_name());
            let params: Vec<String> = def
                .param_names
                .iter()
                .zip(&signature.params)
                .map(|(name, ty)| format!("{} {name}", ty.cpp_name()))
                .collect();
            self.line(&format!(
                "{return_type} {}({}) {{",
                signature.name,
                params.join(", ")
            ));
            self.emit_block(&def.body, Context::Function)?;
            self.line("}");
            self.blank();
        }

        self.line("int main() {");
        self.emit_block(program.statements(), Context::Plain)?;
        self.indent += 1;
        self.line("return 0;");
        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    fn emit_block(&mut self, statements: &[Stmt], context: Context) -> Result<(), CoreError> {
        self.indent += 1;
        for statement in statements {
            self.emit_statement(statement, context)?;
        }
        self.indent -= 1;
        Ok(())
    }

    fn emit_statement(&mut self, statement: &Stmt, context: Context) -> Result<(), CoreError> {
        match statement {
            Stmt::VarDecl {
                scope,
                name,
                ty,
                value,
            } => self.emit_var_decl(*scope, name, ty, value)?,
            Stmt::Assign { name, value } => match value {
                Expr::Container { kind, elements } => {
                    self.emit_container_inserts(name, *kind, elements)?
                }
                _ => {
                    let value = self.expr(value)?;
                    self.line(&format!("{name} = {value};"));
                }
            },
            Stmt::Call(call) => {
                let call = self.call(call)?;
                self.line(&format!("{call};"));
            }
            Stmt::Builtin(call) => {
                let call = self.builtin_call(call)?;
                self.line(&format!("{call};"));
            }
            // Emitted once from the function table.
            Stmt::Function(_) => {}
            Stmt::Try(body) => {
                self.line("try {");
                self.emit_block(body, Context::Plain)?;
                self.line("}");
            }
            Stmt::Catch(body) => {
                self.line("catch (const std::exception& e) {");
                self.emit_block(body, Context::Plain)?;
                self.line("}");
            }
            Stmt::Loop(body) => {
                self.line("while (true) {");
                self.emit_block(body, Context::ControlFlow)?;
                self.line("}");
            }
            Stmt::If { condition, body } => {
                let condition = self.expr(condition)?;
                self.line(&format!("if ({condition}) {{"));
                self.emit_block(body, Context::ControlFlow)?;
                self.line("}");
            }
            Stmt::Donate(value) if context != Context::Plain => {
                let value = self.expr(value)?;
                self.line(&format!("return {value};"));
            }
            Stmt::Leave if context == Context::ControlFlow => self.line("break;"),
            Stmt::Proceed if context == Context::ControlFlow => self.line("continue;"),
            Stmt::Donate(_) | Stmt::Leave | Stmt::Proceed => {
                return Err(CoreError::Internal(format!(
                    "no translation for {statement:?} in a {context:?} body"
                )));
            }
        }
        Ok(())
    }

    fn emit_var_decl(&mut self, scope: Scope, name: &str, ty: &Type, value: &Expr) -> Result<(), CoreError> {
        if let Expr::Container { kind, elements } = value {
            // Globals are already declared above the functions.
            if scope == Scope::Local {
                self.line(&format!("{} {name};", ty.cpp_name()));
            }
            return self.emit_container_inserts(name, *kind, elements);
        }

        let value = self.expr(value)?;
        match scope {
            Scope::Global => self.line(&format!("{name} = {value};")),
            Scope::Local => self.line(&format!("{} {name} = {value};", ty.cpp_name())),
        }
        Ok(())
    }

    /// One insert per literal element, in source order.
    fn emit_container_inserts(&mut self, name: &str, kind: ContainerKind, elements: &[Expr]) -> Result<(), CoreError> {
        for element in elements {
            let element = self.expr(element)?;
            self.line(&format!("{name}.{}({element});", kind.insert_method()));
        }
        Ok(())
    }

    fn expr(&self, expr: &Expr) -> Result<String, CoreError> {
        Ok(match expr {
            Expr::Literal(Literal::Number(value)) => format!("{value:?}"),
            Expr::Literal(Literal::Str(text)) => format!("std::string(\"{text}\")"),
            Expr::Literal(Literal::Bool(value)) => value.to_string(),
            Expr::Ident(name) => name.clone(),
            Expr::Binary { op, lhs, rhs } => {
                format!("{} {} {}", self.expr(lhs)?, op.cpp_symbol(), self.expr(rhs)?)
            }
            Expr::Call(call) => self.call(call)?,
            Expr::Builtin(call) => self.builtin_call(call)?,
            Expr::Container { kind, .. } => {
                return Err(CoreError::Internal(format!(
                    "{}[...] literal outside of a declaration or assignment",
                    kind.marker()
                )));
            }
        })
    }

    fn call(&self, call: &Call) -> Result<String, CoreError> {
        let args = call
            .args
            .iter()
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{}({})", call.name, args.join(", ")))
    }

    fn builtin_call(&self, call: &Call) -> Result<String, CoreError> {
        if find_builtin(&call.name).is_none() {
            return Err(CoreError::SemanticError(format!(
                "unknown builtin 'biro.{}'",
                call.name
            )));
        }
        Ok(format!("{}::{}", builtins::NAMESPACE, self.call(call)?))
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.output.push_str(INDENT);
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn blank(&mut self) {
        self.output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::BuiltinKind;
    use crate::parser::parse;
    use crate::templates::{default_template_root, load_templates};

    fn generate(source: &str) -> Result<String, CoreError> {
        let program = Program::collect(parse(source).expect("parse").statements)?;
        let templates = load_templates(default_template_root()).expect("templates");
        generate_cpp(&program, &templates)
    }

    fn cpp(source: &str) -> String {
        generate(source).expect("generate")
    }

    fn main_body(output: &str) -> &str {
        let start = output.find("int main() {").expect("main");
        &output[start..]
    }

    #[test]
    fn say_template_adds_no_line_breaks() {
        let templates = load_templates(default_template_root()).expect("templates");
        let say = templates.get(BuiltinKind::Say);
        assert!(!say.contains("std::endl"));
        assert!(!say.contains("\\n"));
        assert!(!say.contains("void say()"));

        let output = cpp("biro.say(\"a\")\nbiro.say(\"b\")");
        assert!(output.contains(say.trim_end()));
        let body = main_body(&output);
        assert!(body.contains(
            "    builtins::say(std::string(\"a\"));\n    builtins::say(std::string(\"b\"));\n"
        ));
    }

    #[test]
    fn emits_sections_in_order() {
        let output = cpp("biro g : num = 1\nbiro f () : () { }\nf()");
        let header = output.find("// Generated by the biro compiler").expect("header");
        let include = output.find("#include <iostream>").expect("include");
        let namespace = output.find("namespace builtins {").expect("namespace");
        let global = output.find("float g;").expect("global");
        let function = output.find("void f() {").expect("function");
        let main = output.find("int main() {").expect("main");
        assert!(header < include && include < namespace && namespace < global);
        assert!(global < function && function < main);
        assert!(output.trim_end().ends_with("return 0;\n}"));
    }

    #[test]
    fn comments_every_header_line() {
        let program = Program::collect(Vec::new())
            .expect("collect")
            .with_header("first\nsecond");
        let templates = load_templates(default_template_root()).expect("templates");
        let output = generate_cpp(&program, &templates).expect("generate");
        assert!(output.starts_with("//first\n//second\n"));
    }

    #[test]
    fn global_is_declared_before_functions_and_assigned_in_main() {
        let output = cpp("biro x : num = 5\nbiro show () : () { biro.say(x) }");
        let declaration = output.find("float x;").expect("declaration");
        let function = output.find("void show() {").expect("function");
        assert!(declaration < function);
        assert!(main_body(&output).contains("    x = 5.0;\n"));
    }

    #[test]
    fn keeps_global_declaration_order() {
        let output = cpp("biro zeta : bool = true\nbiro alpha : str = \"a\"");
        let zeta = output.find("bool zeta;").expect("zeta");
        let alpha = output.find("std::string alpha;").expect("alpha");
        assert!(zeta < alpha);
    }

    #[test]
    fn locals_are_declared_in_place() {
        let output = cpp("smallbiro name : str = \"biro\"");
        assert!(main_body(&output).contains("std::string name = std::string(\"biro\");"));
    }

    #[test]
    fn void_and_returning_function_signatures() {
        let output = cpp(
            "biro greet (who, times) : (str, num) { biro.say(who, times) }\n\
             biro add (x, y) : (num, num, num) { donate x + y }",
        );
        assert!(output.contains("void greet(std::string who, float times) {"));
        assert!(output.contains("float add(float x, float y) {\n    return x + y;\n}"));
    }

    #[test]
    fn container_literal_becomes_declaration_plus_inserts() {
        let output = cpp("smallbiro xs : a[num] = a[1, 2, 3]\nsmallbiro st : s[str] = s[\"p\"]");
        let body = main_body(&output);
        let expected = "    std::vector<float> xs;\n    xs.push_back(1.0);\n    xs.push_back(2.0);\n    xs.push_back(3.0);\n";
        assert!(body.contains(expected), "{body}");
        assert!(body.contains("    std::stack<std::string> st;\n    st.push(std::string(\"p\"));\n"));
        assert_eq!(body.matches("push_back").count(), 3);
    }

    #[test]
    fn empty_container_literal_only_declares() {
        let output = cpp("smallbiro xs : a[num] = a[]\nbiro jobs : q[str] = q[]");
        assert!(output.contains("std::queue<std::string> jobs;"));
        let body = main_body(&output);
        assert!(body.contains("    std::vector<float> xs;\n"), "{body}");
        assert!(!body.contains("push"));
        assert!(!body.contains("jobs"));
    }

    #[test]
    fn global_container_literal_only_inserts() {
        let output = cpp("biro jobs : q[num] = q[4, 5]");
        assert!(output.contains("std::queue<float> jobs;"));
        let body = main_body(&output);
        assert!(body.contains("    jobs.push(4.0);\n    jobs.push(5.0);\n"));
        assert!(!body.contains("std::queue"));
    }

    #[test]
    fn translates_operators_through_the_fixed_table() {
        let output = cpp(
            "smallbiro r : bool = a equals b\nr = a more b\nr = a less b\nr = p and q\nr = p or q\n\
             smallbiro n : num = a + b - c * d / e",
        );
        let body = main_body(&output);
        assert!(body.contains("bool r = a == b;"));
        assert!(body.contains("r = a > b;"));
        assert!(body.contains("r = a < b;"));
        assert!(body.contains("r = p && q;"));
        assert!(body.contains("r = p || q;"));
        assert!(body.contains("float n = a + b - c * d / e;"));
    }

    #[test]
    fn loop_with_conditional_break() {
        let output = cpp("biro loop { biro is x more 3 ? { leave } }");
        let expected = "    while (true) {\n        if (x > 3.0) {\n            break;\n        }\n    }\n";
        assert!(main_body(&output).contains(expected));
    }

    #[test]
    fn control_keywords_inside_control_flow_bodies() {
        let output = cpp(
            "biro find (limit) : (num, num) { biro loop { biro is limit less 0 ? { donate limit } proceed } }",
        );
        assert!(output.contains("            return limit;\n"));
        assert!(output.contains("        continue;\n"));
    }

    #[test]
    fn try_and_catch_blocks() {
        let output = cpp("biro attempt { risky() } biro arrest { biro.say(\"failed\") }");
        let body = main_body(&output);
        assert!(body.contains("    try {\n        risky();\n    }\n"));
        assert!(body.contains(
            "    catch (const std::exception& e) {\n        builtins::say(std::string(\"failed\"));\n    }\n"
        ));
    }

    #[test]
    fn builtin_calls_are_namespaced() {
        let output = cpp("smallbiro n : num = biro.len(xs)\nbiro.say(biro.index(xs, 0), true)");
        let body = main_body(&output);
        assert!(body.contains("float n = builtins::len(xs);"));
        assert!(body.contains("builtins::say(builtins::index(xs, 0.0), true);"));
    }

    #[test]
    fn rejects_unknown_builtins() {
        let err = generate("biro.shout(1)").unwrap_err();
        assert!(matches!(err, CoreError::SemanticError(message) if message.contains("biro.shout")));
    }

    #[test]
    fn embeds_every_builtin_template() {
        let output = cpp("");
        let namespace = &output[output.find("namespace builtins {").expect("namespace")..];
        let say = namespace.find("void say(").expect("say");
        let ask = namespace.find("std::string ask(").expect("ask");
        let index = namespace.find("T index(").expect("index");
        let len = namespace.find("float len(").expect("len");
        assert!(say < ask && ask < index && index < len);
    }

    #[test]
    fn nested_function_declarations_emit_nothing_in_place() {
        let output = cpp("biro outer () : () { biro inner () : () { } inner() }");
        assert!(output.contains("void inner() {\n}"));
        assert!(output.contains("void outer() {\n    inner();\n}"));
    }

    #[test]
    fn misplaced_control_statements_are_internal_errors() {
        let program = Program::collect(vec![Stmt::Leave]).expect("collect");
        let templates = load_templates(default_template_root()).expect("templates");
        let err = generate_cpp(&program, &templates).unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }
}
