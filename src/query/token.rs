//! Token types for the query lexer

use std::fmt;

use crate::error::Position;

/// TokenKind represents the type of a token
///
/// Keywords are not a separate kind: the parser recognizes them among
/// [`TokenKind::Word`] tokens, case-insensitively, so a column may share a
/// keyword's name when it is written in brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Bare word: keyword, function name or column name
    Word,
    /// Numeric literal (`42`, `-1.5`)
    Number,
    /// Double-quoted string literal, unescaped
    String,
    /// Column name written in brackets, without the brackets
    Bracketed,
    /// `#n` column index, without the `#`
    IndexRef,
    /// Comparison operator (`<`, `<=`, `=`, `<>`, `!=`, `>=`, `>`)
    Operator,
    /// `(`, `)`, `,`, `*` or `;`
    Punctuator,
    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Word => "word",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Bracketed => "bracketed name",
            TokenKind::IndexRef => "column index",
            TokenKind::Operator => "operator",
            TokenKind::Punctuator => "punctuation",
            TokenKind::Eof => "end of query",
        };
        f.write_str(name)
    }
}

/// Token represents a lexical token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The type of the token
    pub kind: TokenKind,
    /// The literal value, with quotes, brackets and `#` removed
    pub literal: String,
    /// Where the token starts in the query text
    pub position: Position,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, literal: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            literal: literal.into(),
            position,
        }
    }

    /// Check if this is an EOF token
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Check if this is a bare word equal to `keyword` (case-insensitive)
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.literal.eq_ignore_ascii_case(keyword)
    }

    /// Check if this is the given punctuator
    pub fn is_punctuator(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.literal == punct
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of query"),
            TokenKind::String => write!(f, "string \"{}\"", self.literal),
            TokenKind::Bracketed => write!(f, "[{}]", self.literal),
            TokenKind::IndexRef => write!(f, "#{}", self.literal),
            _ => write!(f, "'{}'", self.literal),
        }
    }
}
