//! Lexer for the filter language.
//!
//! Turns filter source text into a stream of [`Token`]s carrying 1-based
//! line/column positions. The lexer never fails: an unrecognized character
//! becomes a [`TokenKind::Error`] token holding the offending character, and
//! tokenization stops there.

#[cfg(not(test))]
use alloc::string::{String, ToString};
#[cfg(not(test))]
use alloc::vec::Vec;

/// Kinds of token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Number literal
    Number,
    /// String literal (text holds the decoded content)
    String,
    /// Identifier
    Ident,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `.`
    Dot,
    /// `|`
    Pipe,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `:`
    Colon,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=`
    Assign,
    /// `|=`
    UpdateAssign,
    /// `+=`
    PlusAssign,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `?`
    Question,
    /// `//`
    Alt,
    /// `..`
    Recurse,
    /// End of input
    Eof,
    /// Unrecognized character
    Error,
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Ident => "identifier",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Null => "'null'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::Dot => "'.'",
            TokenKind::Pipe => "'|'",
            TokenKind::Comma => "','",
            TokenKind::Semi => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Eq => "'=='",
            TokenKind::Ne => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Assign => "'='",
            TokenKind::UpdateAssign => "'|='",
            TokenKind::PlusAssign => "'+='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Question => "'?'",
            TokenKind::Alt => "'//'",
            TokenKind::Recurse => "'..'",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal text. For string tokens this is the decoded content; for
    /// error tokens, the offending character.
    pub text: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, reset at each LF.
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }
}

/// Lexer state over filter source text.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`.
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Peek at the current character without consuming it.
    fn current(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Peek one character past the current one.
    fn peek(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Consume the current character, tracking line and column.
    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    /// Skip a `#` comment up to (not including) the newline.
    fn skip_comment(&mut self) {
        while !matches!(self.current(), Some('\n') | None) {
            self.advance();
        }
    }

    fn read_number(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.column;
        let mut num = String::new();

        if self.current() == Some('-') {
            num.push('-');
            self.advance();
        }
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.current() == Some('.') {
            num.push('.');
            self.advance();
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    num.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if let Some(e @ ('e' | 'E')) = self.current() {
            num.push(e);
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.current() {
                num.push(sign);
                self.advance();
            }
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    num.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        Token::new(TokenKind::Number, num, start_line, start_col)
    }

    /// Read a string literal, decoding escapes.
    ///
    /// Recognized escapes: `\n \t \r \\ \" \/ \b \f`; any other escaped
    /// character is taken literally. An unterminated string yields a token
    /// holding everything up to end of input, with no error raised.
    fn read_string(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.column;
        self.advance(); // opening quote

        let mut s = String::new();
        while let Some(c) = self.current() {
            if c == '"' {
                break;
            }
            if c == '\\' {
                self.advance();
                match self.current() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some('/') => s.push('/'),
                    Some('b') => s.push('\x08'),
                    Some('f') => s.push('\x0C'),
                    Some(other) => s.push(other),
                    None => break,
                }
                self.advance();
            } else {
                s.push(c);
                self.advance();
            }
        }
        if self.current() == Some('"') {
            self.advance();
        }

        Token::new(TokenKind::String, s, start_line, start_col)
    }

    fn read_identifier(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.column;
        let mut id = String::new();

        while let Some(c) = self.current() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                id.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match id.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => TokenKind::Ident,
        };
        Token::new(kind, id, start_line, start_col)
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        while self.current() == Some('#') {
            self.skip_comment();
            self.skip_whitespace();
        }

        let line = self.line;
        let column = self.column;

        let ch = match self.current() {
            Some(c) => c,
            None => return Token::new(TokenKind::Eof, "", line, column),
        };

        if ch.is_ascii_digit()
            || (ch == '-' && matches!(self.peek(), Some(c) if c.is_ascii_digit()))
        {
            return self.read_number();
        }
        if ch == '"' {
            return self.read_string();
        }
        if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' {
            return self.read_identifier();
        }

        // Two-character operators, checked before their one-character
        // prefixes.
        let two = match (ch, self.peek()) {
            ('=', Some('=')) => Some((TokenKind::Eq, "==")),
            ('!', Some('=')) => Some((TokenKind::Ne, "!=")),
            ('<', Some('=')) => Some((TokenKind::Le, "<=")),
            ('>', Some('=')) => Some((TokenKind::Ge, ">=")),
            ('|', Some('=')) => Some((TokenKind::UpdateAssign, "|=")),
            ('+', Some('=')) => Some((TokenKind::PlusAssign, "+=")),
            ('/', Some('/')) => Some((TokenKind::Alt, "//")),
            ('.', Some('.')) => Some((TokenKind::Recurse, "..")),
            _ => None,
        };
        if let Some((kind, text)) = two {
            self.advance();
            self.advance();
            return Token::new(kind, text, line, column);
        }

        self.advance();
        let kind = match ch {
            '.' => TokenKind::Dot,
            '|' => TokenKind::Pipe,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semi,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Assign,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '?' => TokenKind::Question,
            other => {
                return Token::new(TokenKind::Error, other.to_string(), line, column);
            }
        };
        Token::new(kind, ch.to_string(), line, column)
    }

    /// Tokenize the whole input, stopping after `Eof` or the first `Error`
    /// token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = matches!(tok.kind, TokenKind::Eof | TokenKind::Error);
            tokens.push(tok);
            if done {
                return tokens;
            }
        }
    }
}
