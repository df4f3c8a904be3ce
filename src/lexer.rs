//! S-expression lexer with source spans
//!
//! Converts DSL source into a flat stream of tokens, preserving byte offsets
//! for error reporting. The stream always ends with exactly one
//! [`TokenKind::EndOfInput`].

use std::fmt;

use tracing::trace;

use crate::error::{DslError, DslResult};

/// Source span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,` - an optional separator, the parser skips it
    Comma,
    /// Bare identifier, e.g. `fact_sales` or `f.id`
    Identifier,
    /// Single-quoted string literal
    String,
    /// Integer or decimal literal, sign included
    Number,
    /// End of input
    EndOfInput,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Identifier => "identifier",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::EndOfInput => "end of input",
        };
        f.write_str(name)
    }
}

/// One lexical unit
///
/// `text` is the decoded lexeme: for strings it is the unescaped content
/// without quotes, for numbers the verbatim source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Offset of the token's first source character
    pub fn position(&self) -> usize {
        self.span.start
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Identifier => format!("identifier '{}'", self.text),
            TokenKind::String => format!("string '{}'", self.text),
            TokenKind::Number => format!("number {}", self.text),
            other => other.to_string(),
        }
    }
}

/// Tokenize a whole input
///
/// Accepts `&str` or `Option<&str>`; `None` behaves like the empty string.
pub fn tokenize<'a>(source: impl Into<Option<&'a str>>) -> DslResult<Vec<Token>> {
    Lexer::new(source.into().unwrap_or("")).tokenize()
}

/// Single-use lexer over one source string
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Consume the lexer, producing every token up to and including `EndOfInput`
    pub fn tokenize(mut self) -> DslResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_end = token.is_end();
            tokens.push(token);
            if is_end {
                break;
            }
        }

        trace!(count = tokens.len(), "tokenized input");
        Ok(tokens)
    }

    fn next_token(&mut self) -> DslResult<Token> {
        self.skip_whitespace();

        let start = self.current_pos();

        match self.peek_char() {
            None => Ok(Token::new(
                TokenKind::EndOfInput,
                "",
                Span::new(start, start),
            )),
            Some('(') => Ok(self.single(TokenKind::LeftParen, start)),
            Some(')') => Ok(self.single(TokenKind::RightParen, start)),
            Some(',') => Ok(self.single(TokenKind::Comma, start)),
            Some('\'') => self.read_string(start),
            Some(c) if c.is_ascii_digit() => Ok(self.read_number(start)),
            Some('-') if self.peek_next_is_digit() => Ok(self.read_number(start)),
            Some(c) if is_identifier_start(c) => Ok(self.read_identifier(start)),
            Some(c) => Err(DslError::UnexpectedCharacter {
                character: c,
                position: start,
            }),
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        let c = self.advance().unwrap_or_default();
        Token::new(kind, c.to_string(), Span::new(start, self.current_pos()))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if matches!(c, ' ' | '\t' | '\n' | '\r') {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, start: usize) -> DslResult<Token> {
        self.advance(); // consume opening quote

        let mut value = String::new();

        loop {
            match self.advance() {
                None => return Err(DslError::UnterminatedString { position: start }),
                Some('\'') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('\'') => value.push('\''),
                    Some('\\') => value.push('\\'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(DslError::UnterminatedString { position: start }),
                },
                Some(c) => value.push(c),
            }
        }

        Ok(Token::new(
            TokenKind::String,
            value,
            Span::new(start, self.current_pos()),
        ))
    }

    fn read_number(&mut self, start: usize) -> Token {
        if self.peek_char() == Some('-') {
            self.advance();
        }
        self.consume_digits();

        // A '.' belongs to the number only when a digit follows it
        if self.peek_char() == Some('.') && self.peek_next_is_digit() {
            self.advance();
            self.consume_digits();
        }

        let end = self.current_pos();
        Token::new(
            TokenKind::Number,
            &self.input[start..end],
            Span::new(start, end),
        )
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek_char() {
            if is_identifier_char(c) {
                self.advance();
            } else {
                break;
            }
        }

        let end = self.current_pos();
        Token::new(
            TokenKind::Identifier,
            &self.input[start..end],
            Span::new(start, end),
        )
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_is_digit(&self) -> bool {
        let mut chars = self.chars.clone();
        chars.next(); // skip current
        chars
            .peek()
            .map(|(_, c)| c.is_ascii_digit())
            .unwrap_or(false)
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn current_pos(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Dots allow dotted references such as `f.id`
fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '-'
}
