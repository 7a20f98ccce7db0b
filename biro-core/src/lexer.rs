//! Lexer for biro source.
//!
//! Operates on the merged translation unit produced by the preprocessor.
//! Unrecognized input is reported as a [`Diagnostic`] and skipped; lexing
//! never fails outright.

use crate::diagnostic::Diagnostic;
use crate::span::{FileId, Span};

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Special
    Eof,

    // Identifiers and literals
    Ident,
    NumberLiteral,
    StringLiteral,
    BoolLiteral, // true / false

    // Container literal markers: `a[`, `q[`, `s[`
    ArrayMarker,
    QueueMarker,
    StackMarker,

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Colon,    // :
    Dot,      // .
    Question, // ?
    Assign,   // =

    // Operators
    Plus,   // +
    Minus,  // -
    Star,   // *
    Slash,  // /
    Equals, // equals / ==
    More,   // more / >
    Less,   // less / <
    And,
    Or,

    // Keywords
    Biro,
    SmallBiro,
    Is,
    Donate,
    Proceed,
    Leave,
    Loop,
    Attempt,
    Arrest,
    Num,
    Str,
    Bool,
}

impl TokenKind {
    /// Whether a token of this kind can end an operand, in which case a
    /// following `+`/`-` is a binary operator rather than a sign.
    fn ends_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::NumberLiteral
                | TokenKind::StringLiteral
                | TokenKind::BoolLiteral
                | TokenKind::RParen
                | TokenKind::RBracket
        )
    }
}

/// A single token with its kind and span.
///
/// For string literals `text_start`/`text_end` cover the content between
/// the quotes; for every other kind they equal the span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text_start: u32,
    pub text_end: u32,
}

impl Token {
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.text_start as usize..self.text_end as usize]
    }
}

/// Result of lexing a source file.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lex a source string into tokens. The last token is always `Eof`.
pub fn lex(file_id: FileId, source: &str) -> LexResult {
    let mut lexer = Lexer {
        file_id,
        source,
        chars: source.as_bytes(),
        len: source.len(),
        index: 0,
        last_kind: None,
        diagnostics: Vec::new(),
    };
    lexer.run()
}

struct Lexer<'src> {
    file_id: FileId,
    source: &'src str,
    chars: &'src [u8],
    len: usize,
    index: usize,
    last_kind: Option<TokenKind>,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    fn run(&mut self) -> LexResult {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) {
                self.consume_char();
                continue;
            }

            let start = self.index as u32;
            let token = match ch {
                b'(' => self.single(TokenKind::LParen, start),
                b')' => self.single(TokenKind::RParen, start),
                b'{' => self.single(TokenKind::LBrace, start),
                b'}' => self.single(TokenKind::RBrace, start),
                b'[' => self.single(TokenKind::LBracket, start),
                b']' => self.single(TokenKind::RBracket, start),
                b',' => self.single(TokenKind::Comma, start),
                b':' => self.single(TokenKind::Colon, start),
                b'?' => self.single(TokenKind::Question, start),
                b'*' => self.single(TokenKind::Star, start),
                b'>' => self.single(TokenKind::More, start),
                b'<' => self.single(TokenKind::Less, start),
                b'=' => {
                    self.consume_char();
                    if self.peek_char() == Some(b'=') {
                        self.consume_char();
                        self.simple_token(TokenKind::Equals, start)
                    } else {
                        self.simple_token(TokenKind::Assign, start)
                    }
                }
                b'/' => {
                    if self.peek_next() == Some(b'/') {
                        self.skip_line_comment();
                        None
                    } else {
                        self.single(TokenKind::Slash, start)
                    }
                }
                b'+' | b'-' => {
                    if self.starts_signed_number() {
                        self.lex_number(start)
                    } else if ch == b'+' {
                        self.single(TokenKind::Plus, start)
                    } else {
                        self.single(TokenKind::Minus, start)
                    }
                }
                b'.' => {
                    if self.peek_next().is_some_and(|next| next.is_ascii_digit()) {
                        self.lex_number(start)
                    } else {
                        self.single(TokenKind::Dot, start)
                    }
                }
                b'"' => self.lex_string(start),
                b'0'..=b'9' => self.lex_number(start),
                _ => {
                    if is_ident_start(ch) {
                        self.lex_ident_or_keyword(start)
                    } else {
                        self.consume_utf8_char();
                        self.unexpected_char(start)
                    }
                }
            };

            if let Some(tok) = token {
                self.last_kind = Some(tok.kind);
                tokens.push(tok);
            }
        }

        // EOF token at end
        let eof_span = Span::new(self.file_id, self.len as u32, self.len as u32);
        tokens.push(Token {
            kind: TokenKind::Eof,
            span: eof_span,
            text_start: self.len as u32,
            text_end: self.len as u32,
        });

        LexResult {
            tokens,
            diagnostics: std::mem::take(&mut self.diagnostics),
        }
    }

    fn single(&mut self, kind: TokenKind, start: u32) -> Option<Token> {
        self.consume_char();
        self.simple_token(kind, start)
    }

    fn simple_token(&self, kind: TokenKind, start: u32) -> Option<Token> {
        let end = self.index as u32;
        Some(Token {
            kind,
            span: Span::new(self.file_id, start, end),
            text_start: start,
            text_end: end,
        })
    }

    fn unexpected_char(&mut self, start: u32) -> Option<Token> {
        let end = self.index as u32;
        let span = Span::new(self.file_id, start, end);
        let text = &self.source[start as usize..end as usize];
        let diag = Diagnostic::error(format!("unexpected character '{text}'"), span)
            .with_code("E0001");
        self.diagnostics.push(diag);
        None
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == b'\n' {
                break;
            }
            self.consume_char();
        }
    }

    /// A sign belongs to the literal only when it directly precedes digits
    /// (or `.digit`) and the previous token cannot end an operand.
    fn starts_signed_number(&self) -> bool {
        if self.last_kind.is_some_and(TokenKind::ends_operand) {
            return false;
        }
        match self.peek_next() {
            Some(next) if next.is_ascii_digit() => true,
            Some(b'.') => self
                .chars
                .get(self.index + 2)
                .is_some_and(|ch| ch.is_ascii_digit()),
            _ => false,
        }
    }

    fn lex_string(&mut self, start: u32) -> Option<Token> {
        let content_start = self.index + 1;
        let closing = self.chars[content_start..]
            .iter()
            .position(|&ch| ch == b'"')
            .map(|offset| content_start + offset);

        match closing {
            Some(content_end) => {
                self.index = content_end + 1;
                Some(Token {
                    kind: TokenKind::StringLiteral,
                    span: Span::new(self.file_id, start, self.index as u32),
                    text_start: content_start as u32,
                    text_end: content_end as u32,
                })
            }
            None => {
                // Skip the lone quote and keep lexing what follows.
                self.consume_char();
                let span = Span::new(self.file_id, start, self.index as u32);
                let diag = Diagnostic::error("unterminated string literal", span)
                    .with_code("E0002");
                self.diagnostics.push(diag);
                None
            }
        }
    }

    fn lex_number(&mut self, start: u32) -> Option<Token> {
        // [+-]? digits? ('.' digits)?  -- callers guarantee at least one digit
        if matches!(self.peek_char(), Some(b'+' | b'-')) {
            self.consume_char();
        }
        self.consume_digits();

        if self.peek_char() == Some(b'.')
            && self.peek_next().is_some_and(|next| next.is_ascii_digit())
        {
            self.consume_char(); // '.'
            self.consume_digits();
        }

        self.simple_token(TokenKind::NumberLiteral, start)
    }

    fn consume_digits(&mut self) {
        while self.peek_char().is_some_and(|ch| ch.is_ascii_digit()) {
            self.consume_char();
        }
    }

    fn lex_ident_or_keyword(&mut self, start: u32) -> Option<Token> {
        while let Some(ch) = self.peek_char() {
            if is_ident_continue(ch) {
                self.consume_char();
            } else {
                break;
            }
        }

        let end = self.index as u32;
        let text = &self.source[start as usize..end as usize];
        let before_bracket = self.peek_char() == Some(b'[');

        let kind = match text {
            "a" if before_bracket => TokenKind::ArrayMarker,
            "q" if before_bracket => TokenKind::QueueMarker,
            "s" if before_bracket => TokenKind::StackMarker,
            "biro" => TokenKind::Biro,
            "smallbiro" => TokenKind::SmallBiro,
            "is" => TokenKind::Is,
            "equals" => TokenKind::Equals,
            "more" => TokenKind::More,
            "less" => TokenKind::Less,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "donate" => TokenKind::Donate,
            "proceed" => TokenKind::Proceed,
            "leave" => TokenKind::Leave,
            "loop" => TokenKind::Loop,
            "attempt" => TokenKind::Attempt,
            "arrest" => TokenKind::Arrest,
            "num" => TokenKind::Num,
            "str" => TokenKind::Str,
            "bool" => TokenKind::Bool,
            "true" | "false" => TokenKind::BoolLiteral,
            _ => TokenKind::Ident,
        };

        self.simple_token(kind, start)
    }

    fn peek_char(&self) -> Option<u8> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.chars.get(self.index + 1).copied()
    }

    fn consume_char(&mut self) {
        if self.index < self.len {
            self.index += 1;
        }
    }

    /// Step over one whole UTF-8 scalar so spans stay on char boundaries.
    fn consume_utf8_char(&mut self) {
        let width = self.source[self.index..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.index = (self.index + width).min(self.len);
    }
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
