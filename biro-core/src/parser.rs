//! Recursive-descent parser for biro.
//!
//! The parser is pure: it turns the token stream into a list of
//! [`Stmt`]s and touches no program-wide tables. Global and function
//! registration happens afterwards in [`crate::program`].
//!
//! Binary operator precedence, loosest first:
//!
//! | level | operators | associativity |
//! |---|---|---|
//! | 1 | `and`, `or` | left |
//! | 2 | `*`, `/` | left |
//! | 3 | `+`, `-` | left |
//! | 4 | `equals`/`==`, `more`/`>`, `less`/`<` | none |
//!
//! The generator prints binary expressions without parentheses, so the
//! tree shape above never leaks into the emitted code.

use crate::ast::{BinaryOp, Call, Expr, FunctionDecl, Literal, Param, Scope, Stmt};
use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::lexer::{LexResult, Token, TokenKind, lex};
use crate::span::{FileId, line_col};
use crate::types::{ContainerKind, ScalarType, Type};

/// Statements of one translation unit plus the lexer's recoverable
/// diagnostics.
#[derive(Debug)]
pub struct Parsed {
    pub statements: Vec<Stmt>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn parse(source: &str) -> Result<Parsed, CoreError> {
    let LexResult {
        tokens,
        diagnostics,
    } = lex(FileId::default(), source);
    log::debug!("lexed {} tokens", tokens.len());

    let mut parser = Parser {
        source,
        tokens: &tokens,
        position: 0,
    };
    let statements = parser.parse_statements(Body::Plain, TokenKind::Eof)?;
    Ok(Parsed {
        statements,
        diagnostics,
    })
}

/// Which extra productions a block admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    /// Top level, `attempt` and `arrest` bodies.
    Plain,
    /// Function bodies: `donate`.
    Function,
    /// Loop and conditional bodies: `donate`, `leave`, `proceed`.
    ControlFlow,
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    fn parse_statements(&mut self, body: Body, close: TokenKind) -> Result<Vec<Stmt>, CoreError> {
        let mut statements = Vec::new();
        while self.peek().kind != close {
            statements.push(self.parse_statement(body)?);
        }
        Ok(statements)
    }

    fn parse_block(&mut self, body: Body) -> Result<Vec<Stmt>, CoreError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let statements = self.parse_statements(body, TokenKind::RBrace)?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(statements)
    }

    fn parse_statement(&mut self, body: Body) -> Result<Stmt, CoreError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Biro => {
                self.advance();
                self.parse_biro_statement()
            }
            TokenKind::SmallBiro => {
                self.advance();
                let name = self.expect_ident()?;
                self.parse_var_decl(Scope::Local, name)
            }
            TokenKind::Ident => {
                let name = self.expect_ident()?;
                match self.peek().kind {
                    TokenKind::Assign => {
                        self.advance();
                        let value = self.parse_value()?;
                        Ok(Stmt::Assign { name, value })
                    }
                    TokenKind::LParen => Ok(Stmt::Call(self.parse_call_args(name)?)),
                    _ => Err(self.unexpected("'=' or '('")),
                }
            }
            TokenKind::Donate if body != Body::Plain => {
                self.advance();
                Ok(Stmt::Donate(self.parse_expr()?))
            }
            TokenKind::Leave if body == Body::ControlFlow => {
                self.advance();
                Ok(Stmt::Leave)
            }
            TokenKind::Proceed if body == Body::ControlFlow => {
                self.advance();
                Ok(Stmt::Proceed)
            }
            _ => Err(self.unexpected("a statement")),
        }
    }

    /// Everything introduced by the `biro` keyword.
    fn parse_biro_statement(&mut self) -> Result<Stmt, CoreError> {
        match self.peek().kind {
            TokenKind::Is => {
                self.advance();
                let condition = self.parse_expr()?;
                self.expect(TokenKind::Question, "'?'")?;
                let body = self.parse_block(Body::ControlFlow)?;
                Ok(Stmt::If { condition, body })
            }
            TokenKind::Loop => {
                self.advance();
                Ok(Stmt::Loop(self.parse_block(Body::ControlFlow)?))
            }
            TokenKind::Attempt => {
                self.advance();
                Ok(Stmt::Try(self.parse_block(Body::Plain)?))
            }
            TokenKind::Arrest => {
                self.advance();
                Ok(Stmt::Catch(self.parse_block(Body::Plain)?))
            }
            TokenKind::Dot => {
                self.advance();
                let name = self.expect_ident()?;
                Ok(Stmt::Builtin(self.parse_call_args(name)?))
            }
            TokenKind::Ident => {
                let name = self.expect_ident()?;
                match self.peek().kind {
                    TokenKind::Colon => self.parse_var_decl(Scope::Global, name),
                    TokenKind::LParen => self.parse_function(name),
                    _ => Err(self.unexpected("':' or '('")),
                }
            }
            _ => Err(self.unexpected("a declaration or construct after 'biro'")),
        }
    }

    fn parse_var_decl(&mut self, scope: Scope, name: String) -> Result<Stmt, CoreError> {
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.parse_value()?;
        Ok(Stmt::VarDecl {
            scope,
            name,
            ty,
            value,
        })
    }

    /// `biro name ( args ) : ( types ) { body }`
    ///
    /// With as many types as arguments the function returns nothing; one
    /// extra trailing type is the return type. Anything else is rejected.
    fn parse_function(&mut self, name: String) -> Result<Stmt, CoreError> {
        self.expect(TokenKind::LParen, "'('")?;
        let arg_names = self.parse_separated(TokenKind::RParen, |parser| parser.expect_ident())?;
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Colon, "':'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut types = self.parse_separated(TokenKind::RParen, |parser| parser.parse_type())?;
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.parse_block(Body::Function)?;

        let return_type = if types.len() == arg_names.len() {
            None
        } else if types.len() == arg_names.len() + 1 {
            types.pop()
        } else {
            return Err(CoreError::SemanticError(format!(
                "not all types are defined for function {name}({}): {} argument(s) but {} type(s)",
                arg_names.join(", "),
                arg_names.len(),
                types.len(),
            )));
        };

        let params = arg_names
            .into_iter()
            .zip(types)
            .map(|(name, ty)| Param { name, ty })
            .collect();

        Ok(Stmt::Function(FunctionDecl {
            name,
            params,
            return_type,
            body,
        }))
    }

    fn parse_type(&mut self) -> Result<Type, CoreError> {
        if let Some(scalar) = self.parse_scalar_type() {
            return Ok(Type::Scalar(scalar));
        }
        let Some(kind) = container_kind(self.peek().kind) else {
            return Err(self.unexpected("a type"));
        };
        self.advance();
        self.expect(TokenKind::LBracket, "'['")?;
        let element = self
            .parse_scalar_type()
            .ok_or_else(|| self.unexpected("'num', 'str' or 'bool'"))?;
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Type::Container(kind, element))
    }

    fn parse_scalar_type(&mut self) -> Option<ScalarType> {
        let scalar = match self.peek().kind {
            TokenKind::Num => ScalarType::Num,
            TokenKind::Str => ScalarType::Str,
            TokenKind::Bool => ScalarType::Bool,
            _ => return None,
        };
        self.advance();
        Some(scalar)
    }

    /// Right-hand side of a declaration or assignment: an expression or a
    /// container literal.
    fn parse_value(&mut self) -> Result<Expr, CoreError> {
        match container_kind(self.peek().kind) {
            Some(kind) => {
                self.advance();
                self.expect(TokenKind::LBracket, "'['")?;
                let elements = self.parse_separated(TokenKind::RBracket, |parser| parser.parse_expr())?;
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::Container { kind, elements })
            }
            None => self.parse_expr(),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, CoreError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::And => BinaryOp::And,
                TokenKind::Or => BinaryOp::Or,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CoreError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, CoreError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, CoreError> {
        let lhs = self.parse_primary()?;
        let Some(op) = comparison_op(self.peek().kind) else {
            return Ok(lhs);
        };
        self.advance();
        let rhs = self.parse_primary()?;
        if comparison_op(self.peek().kind).is_some() {
            return Err(self.error_at_current("comparison operators cannot be chained"));
        }
        Ok(Expr::binary(op, lhs, rhs))
    }

    fn parse_primary(&mut self) -> Result<Expr, CoreError> {
        let token = self.peek();
        match token.kind {
            TokenKind::NumberLiteral => {
                let text = token.text(self.source);
                let value = text.parse::<f64>().map_err(|_| {
                    self.error_at_current(&format!("invalid number literal '{text}'"))
                })?;
                self.advance();
                Ok(Expr::Literal(Literal::Number(value)))
            }
            TokenKind::StringLiteral => {
                let text = token.text(self.source).to_string();
                self.advance();
                Ok(Expr::Literal(Literal::Str(text)))
            }
            TokenKind::BoolLiteral => {
                let value = token.text(self.source) == "true";
                self.advance();
                Ok(Expr::Literal(Literal::Bool(value)))
            }
            TokenKind::Ident => {
                let name = self.expect_ident()?;
                if self.peek().kind == TokenKind::LParen {
                    Ok(Expr::Call(self.parse_call_args(name)?))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            TokenKind::Biro => {
                self.advance();
                self.expect(TokenKind::Dot, "'.'")?;
                let name = self.expect_ident()?;
                Ok(Expr::Builtin(self.parse_call_args(name)?))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_call_args(&mut self, name: String) -> Result<Call, CoreError> {
        self.expect(TokenKind::LParen, "'('")?;
        let args = self.parse_separated(TokenKind::RParen, |parser| parser.parse_expr())?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Call { name, args })
    }

    /// Comma separated items up to (not including) `close`; may be empty.
    fn parse_separated<T>(
        &mut self,
        close: TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, CoreError>,
    ) -> Result<Vec<T>, CoreError> {
        let mut items = Vec::new();
        if self.peek().kind == close {
            return Ok(items);
        }
        loop {
            items.push(item(self)?);
            if self.peek().kind != TokenKind::Comma {
                return Ok(items);
            }
            self.advance();
        }
    }

    fn expect_ident(&mut self) -> Result<String, CoreError> {
        let token = self.peek();
        if token.kind != TokenKind::Ident {
            return Err(self.unexpected("an identifier"));
        }
        let name = token.text(self.source).to_string();
        self.advance();
        Ok(name)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), CoreError> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn peek(&self) -> &'a Token {
        // The lexer always terminates the stream with Eof and the parser
        // never advances past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.peek().kind != TokenKind::Eof {
            self.position += 1;
        }
    }

    fn unexpected(&self, expected: &str) -> CoreError {
        let found = self.describe(self.peek());
        self.error_at_current(&format!("unexpected {found}, expected {expected}"))
    }

    fn error_at_current(&self, message: &str) -> CoreError {
        let (line, _) = line_col(self.source, self.peek().span.start);
        CoreError::ParseError {
            line,
            message: message.to_string(),
        }
    }

    fn describe(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => {
                let text = &self.source[token.span.start as usize..token.span.end as usize];
                format!("token '{text}'")
            }
        }
    }
}

fn container_kind(kind: TokenKind) -> Option<ContainerKind> {
    match kind {
        TokenKind::ArrayMarker => Some(ContainerKind::Array),
        TokenKind::QueueMarker => Some(ContainerKind::Queue),
        TokenKind::StackMarker => Some(ContainerKind::Stack),
        _ => None,
    }
}

fn comparison_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Equals => Some(BinaryOp::Equals),
        TokenKind::More => Some(BinaryOp::More),
        TokenKind::Less => Some(BinaryOp::Less),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(source: &str) -> Vec<Stmt> {
        parse(source).expect("parse").statements
    }

    fn parse_err(source: &str) -> CoreError {
        parse(source).unwrap_err()
    }

    fn num(value: f64) -> Expr {
        Expr::Literal(Literal::Number(value))
    }

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    #[test]
    fn parses_global_declaration() {
        assert_eq!(
            statements("biro x : num = 5"),
            vec![Stmt::VarDecl {
                scope: Scope::Global,
                name: "x".to_string(),
                ty: Type::NUM,
                value: num(5.0),
            }]
        );
    }

    #[test]
    fn parses_local_container_declaration() {
        let parsed = statements(r#"smallbiro names : q[str] = q["a", "b"]"#);
        assert_eq!(
            parsed,
            vec![Stmt::VarDecl {
                scope: Scope::Local,
                name: "names".to_string(),
                ty: Type::Container(ContainerKind::Queue, ScalarType::Str),
                value: Expr::Container {
                    kind: ContainerKind::Queue,
                    elements: vec![
                        Expr::Literal(Literal::Str("a".to_string())),
                        Expr::Literal(Literal::Str("b".to_string())),
                    ],
                },
            }]
        );
    }

    #[test]
    fn variable_named_a_is_not_a_container() {
        let parsed = statements("a = a + 1");
        assert_eq!(
            parsed,
            vec![Stmt::Assign {
                name: "a".to_string(),
                value: Expr::binary(BinaryOp::Add, ident("a"), num(1.0)),
            }]
        );
    }

    #[test]
    fn parses_loop_with_conditional_leave() {
        let parsed = statements("biro loop { biro is x more 3 ? { leave } }");
        assert_eq!(
            parsed,
            vec![Stmt::Loop(vec![Stmt::If {
                condition: Expr::binary(BinaryOp::More, ident("x"), num(3.0)),
                body: vec![Stmt::Leave],
            }])]
        );
    }

    #[test]
    fn void_function_pairs_every_type_with_an_argument() {
        let parsed = statements("biro greet (who) : (str) { biro.say(who) }");
        let Stmt::Function(function) = &parsed[0] else {
            panic!("expected function");
        };
        assert_eq!(function.name, "greet");
        assert_eq!(function.return_type, None);
        assert_eq!(
            function.params,
            vec![Param {
                name: "who".to_string(),
                ty: Type::STR,
            }]
        );
    }

    #[test]
    fn extra_trailing_type_is_the_return_type() {
        let parsed = statements("biro add (x, y) : (num, num, num) { donate x + y }");
        let Stmt::Function(function) = &parsed[0] else {
            panic!("expected function");
        };
        assert_eq!(function.return_type, Some(Type::NUM));
        assert_eq!(function.param_types(), vec![Type::NUM, Type::NUM]);
        assert_eq!(
            function.body,
            vec![Stmt::Donate(Expr::binary(BinaryOp::Add, ident("x"), ident("y")))]
        );
    }

    #[test]
    fn rejects_mismatched_function_arity() {
        let err = parse_err("biro f (x, y) : (num) { }");
        match err {
            CoreError::SemanticError(message) => assert!(message.contains("f(x, y)")),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            parse_err("biro g () : (num, num) { }"),
            CoreError::SemanticError(_)
        ));
    }

    #[test]
    fn control_keywords_are_rejected_outside_their_bodies() {
        assert!(matches!(parse_err("leave"), CoreError::ParseError { .. }));
        assert!(matches!(parse_err("donate 1"), CoreError::ParseError { .. }));
        assert!(matches!(
            parse_err("biro f () : () { proceed }"),
            CoreError::ParseError { .. }
        ));
        assert!(matches!(
            parse_err("biro loop { biro attempt { leave } }"),
            CoreError::ParseError { .. }
        ));
    }

    #[test]
    fn comparisons_bind_tighter_than_arithmetic() {
        let parsed = statements("y = x + 1 more 3 and ok");
        let expected = Expr::binary(
            BinaryOp::And,
            Expr::binary(
                BinaryOp::Add,
                ident("x"),
                Expr::binary(BinaryOp::More, num(1.0), num(3.0)),
            ),
            ident("ok"),
        );
        assert_eq!(
            parsed,
            vec![Stmt::Assign {
                name: "y".to_string(),
                value: expected,
            }]
        );
    }

    #[test]
    fn comparisons_do_not_chain() {
        let err = parse_err("y = 1 less 2 less 3");
        assert!(matches!(err, CoreError::ParseError { .. }));
    }

    #[test]
    fn parses_builtin_calls_as_statements_and_expressions() {
        let parsed = statements("biro.say(biro.len(xs), f(1, true))");
        assert_eq!(
            parsed,
            vec![Stmt::Builtin(Call {
                name: "say".to_string(),
                args: vec![
                    Expr::Builtin(Call {
                        name: "len".to_string(),
                        args: vec![ident("xs")],
                    }),
                    Expr::Call(Call {
                        name: "f".to_string(),
                        args: vec![num(1.0), Expr::Literal(Literal::Bool(true))],
                    }),
                ],
            })]
        );
    }

    #[test]
    fn parses_try_and_catch_blocks() {
        let parsed = statements("biro attempt { f() } biro arrest { }");
        assert_eq!(
            parsed,
            vec![
                Stmt::Try(vec![Stmt::Call(Call {
                    name: "f".to_string(),
                    args: vec![],
                })]),
                Stmt::Catch(vec![]),
            ]
        );
    }

    #[test]
    fn parse_error_names_the_offending_token_and_line() {
        let err = parse_err("biro x : num = 1\nbiro y : num = )");
        match err {
            CoreError::ParseError { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("')'"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn reports_unexpected_end_of_input() {
        let err = parse_err("biro loop {");
        assert!(err.to_string().contains("end of input"));
    }

    #[test]
    fn rejects_nested_container_types() {
        assert!(matches!(
            parse_err("biro x : a[a[num]] = a[]"),
            CoreError::ParseError { .. }
        ));
    }

    #[test]
    fn empty_source_has_no_statements() {
        assert!(statements("// nothing here\n").is_empty());
    }

    #[test]
    fn carries_lex_diagnostics() {
        let parsed = parse("biro x : num = 1 @").expect("lex errors are recoverable");
        assert_eq!(parsed.statements.len(), 1);
        assert_eq!(parsed.diagnostics.len(), 1);
    }
}
