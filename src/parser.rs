//! Precedence-climbing parser for the filter language.
//!
//! Consumes the token stream produced by [`Lexer`](crate::lexer::Lexer) and
//! builds an [`Expr`] tree. Precedence, lowest to highest:
//!
//! ```text
//! pipe  ::=  comma ('|' comma)*
//! comma ::=  alt (',' alt)*
//! alt   ::=  cmp ('//' cmp)*
//! cmp   ::=  add (('==' | '!=' | '<' | '<=' | '>' | '>=') add)*
//! add   ::=  mul (('+' | '-') mul)*
//! mul   ::=  postfix (('*' | '/' | '%') postfix)*
//! ```
//!
//! followed by postfix access chains and primaries. A bare `.foo` parses to
//! `Field`; the same access after a base expression parses to
//! `Pipe(base, Field)`, so `.users[0].name` is a left-nested pipe chain.

#[cfg(not(test))]
use alloc::boxed::Box;
#[cfg(not(test))]
use alloc::format;
#[cfg(not(test))]
use alloc::string::String;
#[cfg(not(test))]
use alloc::vec;
#[cfg(not(test))]
use alloc::vec::Vec;

use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::lexer::{Token, TokenKind};
use crate::value::JsonValue;

/// Error that occurs during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// 1-based line of the token the parser stopped at.
    pub line: usize,
    /// 1-based column of the token the parser stopped at.
    pub column: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "parse error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

/// Parse a token stream into an expression.
///
/// The whole stream must form one expression; trailing tokens are an error.
/// The parser never panics.
pub fn parse(tokens: &[Token]) -> Result<Expr, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::new("empty token stream", 1, 1));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_pipe_expr()?;
    let tok = parser.current();
    if tok.kind != TokenKind::Eof {
        return Err(parser.err_here(format!("unexpected token after expression: {}", tok.kind)));
    }
    Ok(expr)
}

/// Parser state over a token slice.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    /// The current token; past the end this sticks at the final token,
    /// which `tokenize` guarantees is `Eof` or `Error`.
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Consume the current token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail.
    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        let tok = self.current();
        if tok.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.err_here(format!("expected {}, found {}", kind, tok.kind)))
        }
    }

    /// Build an error positioned at the current token.
    fn err_here(&self, message: impl Into<String>) -> ParseError {
        let tok = self.current();
        ParseError::new(message, tok.line, tok.column)
    }

    /// Parse pipe composition: `expr | expr`.
    fn parse_pipe_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comma_expr()?;
        while self.eat(TokenKind::Pipe) {
            let right = self.parse_comma_expr()?;
            left = Expr::pipe(left, right);
        }
        Ok(left)
    }

    /// Parse comma outputs: `expr, expr`.
    fn parse_comma_expr(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_alt_expr()?;
        if self.current().kind != TokenKind::Comma {
            return Ok(first);
        }
        let mut children = vec![first];
        while self.eat(TokenKind::Comma) {
            children.push(self.parse_alt_expr()?);
        }
        Ok(Expr::Comma(children))
    }

    /// Parse the alternative operator: `expr // expr`.
    fn parse_alt_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_compare_expr()?;
        while self.eat(TokenKind::Alt) {
            let right = self.parse_compare_expr()?;
            left = Expr::Alternative(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Parse comparisons: `==`, `!=`, `<`, `<=`, `>`, `>=`.
    fn parse_compare_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            left = Expr::binary(op, left, right);
        }
    }

    /// Parse addition and subtraction.
    fn parse_additive_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::binary(op, left, right);
        }
    }

    /// Parse multiplication, division and modulo.
    fn parse_multiplicative_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_postfix_expr()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_postfix_expr()?;
            left = Expr::binary(op, left, right);
        }
    }

    /// Parse postfix access chains: `.ident`, `.[...]`, `[...]` after a
    /// base expression, each becoming `Pipe(base, access)`.
    fn parse_postfix_expr(&mut self) -> Result<Expr, ParseError> {
        let mut base = self.parse_primary_expr()?;
        loop {
            match self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    if self.current().kind == TokenKind::Ident {
                        let name = self.current().text.clone();
                        self.advance();
                        base = Expr::pipe(base, Expr::Field(name));
                    } else if self.current().kind == TokenKind::LBracket {
                        let access = self.parse_bracket_suffix()?;
                        base = Expr::pipe(base, access);
                    } else {
                        // Trailing '.': identity on the base.
                        base = Expr::pipe(base, Expr::Identity);
                    }
                }
                TokenKind::LBracket => {
                    let access = self.parse_bracket_suffix()?;
                    base = Expr::pipe(base, access);
                }
                _ => return Ok(base),
            }
        }
    }

    /// Parse a bracketed access: `[]` iterates, `[e]` indexes, `[a:b]`
    /// slices. The opening bracket is still current.
    fn parse_bracket_suffix(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LBracket)?;
        if self.eat(TokenKind::RBracket) {
            return Ok(Expr::Iterate);
        }
        let first = self.parse_pipe_expr()?;
        if self.eat(TokenKind::Colon) {
            let end = self.parse_pipe_expr()?;
            self.expect(TokenKind::RBracket)?;
            Ok(Expr::slice(first, end))
        } else {
            self.expect(TokenKind::RBracket)?;
            Ok(Expr::index(first))
        }
    }

    /// Parse a primary expression.
    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Number => {
                self.advance();
                let n: f64 = tok.text.parse().map_err(|_| {
                    ParseError::new(
                        format!("invalid number literal '{}'", tok.text),
                        tok.line,
                        tok.column,
                    )
                })?;
                Ok(Expr::Literal(JsonValue::number(n)))
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Literal(JsonValue::string(tok.text.as_str())))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(JsonValue::boolean(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(JsonValue::boolean(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(JsonValue::null()))
            }
            TokenKind::Dot => {
                self.advance();
                if self.current().kind == TokenKind::Ident {
                    let name = self.current().text.clone();
                    self.advance();
                    Ok(Expr::Field(name))
                } else if self.current().kind == TokenKind::LBracket {
                    self.parse_bracket_suffix()
                } else {
                    Ok(Expr::Identity)
                }
            }
            TokenKind::Recurse => {
                self.advance();
                Ok(Expr::Recurse)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_pipe_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_array_constructor(),
            TokenKind::LBrace => self.parse_object_constructor(),
            TokenKind::Ident => {
                self.advance();
                if self.current().kind == TokenKind::LParen {
                    self.parse_call_args(tok.text)
                } else {
                    // A bare identifier is a zero-argument function call.
                    Ok(Expr::call(tok.text))
                }
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_postfix_expr()?;
                Ok(Expr::unary(UnaryOp::Neg, operand))
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_postfix_expr()?;
                Ok(Expr::unary(UnaryOp::Not, operand))
            }
            TokenKind::Error => Err(self.err_here(format!("unexpected character '{}'", tok.text))),
            other => Err(self.err_here(format!("unexpected token {}", other))),
        }
    }

    /// Parse an array constructor: `[]` or `[pipe]`.
    fn parse_array_constructor(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LBracket)?;
        if self.eat(TokenKind::RBracket) {
            return Ok(Expr::ArrayLit(None));
        }
        let body = self.parse_pipe_expr()?;
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::ArrayLit(Some(Box::new(body))))
    }

    /// Parse an object constructor: `{key: value, ...}`. Keys are string
    /// literals, identifiers, or parenthesized expressions. Values parse at
    /// the alternative level; parenthesize to embed pipes or commas.
    fn parse_object_constructor(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        if self.eat(TokenKind::RBrace) {
            return Ok(Expr::ObjectLit(entries));
        }
        loop {
            let key = match self.current().kind {
                TokenKind::String | TokenKind::Ident => {
                    let text = self.current().text.clone();
                    self.advance();
                    Expr::Literal(JsonValue::string(text.as_str()))
                }
                TokenKind::LParen => {
                    self.advance();
                    let key = self.parse_pipe_expr()?;
                    self.expect(TokenKind::RParen)?;
                    key
                }
                other => {
                    return Err(self.err_here(format!("expected object key, found {}", other)));
                }
            };
            self.expect(TokenKind::Colon)?;
            let value = self.parse_alt_expr()?;
            entries.push((key, value));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::ObjectLit(entries))
    }

    /// Parse call arguments: `(pipe (';' pipe)*)`.
    fn parse_call_args(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.current().kind != TokenKind::RParen {
            args.push(self.parse_pipe_expr()?);
            while self.eat(TokenKind::Semi) {
                args.push(self.parse_pipe_expr()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Expr::Call { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_str(input: &str) -> Result<Expr, ParseError> {
        parse(&Lexer::new(input).tokenize())
    }

    fn ok(input: &str) -> Expr {
        parse_str(input).expect("parse failed")
    }

    #[test]
    fn test_identity() {
        assert_eq!(ok("."), Expr::Identity);
    }

    #[test]
    fn test_bare_field() {
        assert_eq!(ok(".name"), Expr::Field("name".into()));
    }

    #[test]
    fn test_chained_fields_become_pipes() {
        assert_eq!(
            ok(".a.b"),
            Expr::pipe(Expr::Field("a".into()), Expr::Field("b".into()))
        );
    }

    #[test]
    fn test_brackets() {
        assert_eq!(ok(".[]"), Expr::Iterate);
        assert_eq!(
            ok(".[0]"),
            Expr::index(Expr::Literal(JsonValue::number(0.0)))
        );
        assert_eq!(
            ok(r#".["key"]"#),
            Expr::index(Expr::Literal(JsonValue::string("key")))
        );
        assert_eq!(
            ok(".[1:3]"),
            Expr::slice(
                Expr::Literal(JsonValue::number(1.0)),
                Expr::Literal(JsonValue::number(3.0))
            )
        );
    }

    #[test]
    fn test_negative_index() {
        assert_eq!(
            ok(".[-1]"),
            Expr::index(Expr::Literal(JsonValue::number(-1.0)))
        );
    }

    #[test]
    fn test_postfix_chain() {
        // .users[0].name => Pipe(Pipe(Field(users), Index(0)), Field(name))
        assert_eq!(
            ok(".users[0].name"),
            Expr::pipe(
                Expr::pipe(
                    Expr::Field("users".into()),
                    Expr::index(Expr::Literal(JsonValue::number(0.0)))
                ),
                Expr::Field("name".into())
            )
        );
    }

    #[test]
    fn test_pipe() {
        assert_eq!(
            ok(".[] | .name"),
            Expr::pipe(Expr::Iterate, Expr::Field("name".into()))
        );
    }

    #[test]
    fn test_comma_collects_children() {
        assert_eq!(
            ok(".a, .b, .c"),
            Expr::Comma(vec![
                Expr::Field("a".into()),
                Expr::Field("b".into()),
                Expr::Field("c".into()),
            ])
        );
    }

    #[test]
    fn test_comma_binds_tighter_than_pipe() {
        assert_eq!(
            ok(".a, .b | .c"),
            Expr::pipe(
                Expr::Comma(vec![Expr::Field("a".into()), Expr::Field("b".into())]),
                Expr::Field("c".into())
            )
        );
    }

    #[test]
    fn test_alternative() {
        assert_eq!(
            ok(".a // .b"),
            Expr::Alternative(
                Box::new(Expr::Field("a".into())),
                Box::new(Expr::Field("b".into()))
            )
        );
    }

    #[test]
    fn test_arithmetic_precedence() {
        // .a + 2 * 3 => Add(.a, Mul(2, 3))
        assert_eq!(
            ok(".a + 2 * 3"),
            Expr::binary(
                BinaryOp::Add,
                Expr::Field("a".into()),
                Expr::binary(
                    BinaryOp::Mul,
                    Expr::Literal(JsonValue::number(2.0)),
                    Expr::Literal(JsonValue::number(3.0))
                )
            )
        );
    }

    #[test]
    fn test_comparison() {
        assert_eq!(
            ok(".a <= 5"),
            Expr::binary(
                BinaryOp::Le,
                Expr::Field("a".into()),
                Expr::Literal(JsonValue::number(5.0))
            )
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            ok("-.a"),
            Expr::unary(UnaryOp::Neg, Expr::Field("a".into()))
        );
        assert_eq!(
            ok("not .a"),
            Expr::unary(UnaryOp::Not, Expr::Field("a".into()))
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(ok("42"), Expr::Literal(JsonValue::number(42.0)));
        assert_eq!(ok("\"hi\""), Expr::Literal(JsonValue::string("hi")));
        assert_eq!(ok("true"), Expr::Literal(JsonValue::boolean(true)));
        assert_eq!(ok("null"), Expr::Literal(JsonValue::null()));
    }

    #[test]
    fn test_recursive_descent() {
        assert_eq!(ok(".."), Expr::Recurse);
    }

    #[test]
    fn test_parens_group() {
        assert_eq!(
            ok("(.a).b"),
            Expr::pipe(Expr::Field("a".into()), Expr::Field("b".into()))
        );
    }

    #[test]
    fn test_bare_identifier_is_call() {
        assert_eq!(ok("keys"), Expr::call("keys"));
    }

    #[test]
    fn test_call_with_args() {
        assert_eq!(
            ok("foo(.a; .b)"),
            Expr::Call {
                name: "foo".into(),
                args: vec![Expr::Field("a".into()), Expr::Field("b".into())],
            }
        );
    }

    #[test]
    fn test_array_constructor() {
        assert_eq!(ok("[]"), Expr::ArrayLit(None));
        assert_eq!(
            ok("[.a, .b]"),
            Expr::ArrayLit(Some(Box::new(Expr::Comma(vec![
                Expr::Field("a".into()),
                Expr::Field("b".into()),
            ]))))
        );
    }

    #[test]
    fn test_object_constructor() {
        assert_eq!(
            ok(r#"{a: .x, "b c": .y, (.k): .z}"#),
            Expr::ObjectLit(vec![
                (Expr::Literal(JsonValue::string("a")), Expr::Field("x".into())),
                (
                    Expr::Literal(JsonValue::string("b c")),
                    Expr::Field("y".into())
                ),
                (Expr::Field("k".into()), Expr::Field("z".into())),
            ])
        );
        assert_eq!(ok("{}"), Expr::ObjectLit(vec![]));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_str(". .a ]").unwrap_err();
        assert!(err.message.contains("unexpected token after expression"));
    }

    #[test]
    fn test_unclosed_paren() {
        let err = parse_str("(.a").unwrap_err();
        assert!(err.message.contains("expected ')'"));
    }

    #[test]
    fn test_lexical_error_surfaces() {
        let err = parse_str(".a | @").unwrap_err();
        assert!(err.message.contains("unexpected character '@'"));
    }

    #[test]
    fn test_error_position() {
        let err = parse_str(".a |").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 5);
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(parse_str("").is_err());
    }
}
