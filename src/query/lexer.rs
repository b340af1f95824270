//! Query lexer (tokenizer)
//!
//! Splits query text into [`Token`]s. Bare words run over letters, digits, `_`,
//! `-` and `.`, so hyphenated column names need no quoting; a word that parses
//! as a number becomes a [`TokenKind::Number`], which is also how negative
//! literals such as `-5` are read.

use super::token::{Token, TokenKind};
use crate::error::{EngineError, EngineResult, Position};

/// Query lexer for tokenizing input
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Index of the current character in `input`
    index: usize,
    /// Current character, `'\0'` at end of input
    ch: char,
    /// Position of the current character
    pos: Position,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let input: Vec<char> = input.chars().collect();
        let ch = input.first().copied().unwrap_or('\0');
        Self {
            input,
            index: 0,
            ch,
            pos: Position::new(0, 1, 1),
        }
    }

    /// Advance to the next character, keeping line and column current
    fn read_char(&mut self) {
        if self.index >= self.input.len() {
            return;
        }
        self.pos.offset += self.ch.len_utf8();
        if self.ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        self.index += 1;
        self.ch = self.input.get(self.index).copied().unwrap_or('\0');
    }

    fn peek_char(&self) -> char {
        self.input.get(self.index + 1).copied().unwrap_or('\0')
    }

    fn at_end(&self) -> bool {
        self.index >= self.input.len()
    }

    /// Get the next token
    ///
    /// # Returns
    /// * `Ok(Token)`; a [`TokenKind::Eof`] token once the input is exhausted
    /// * `Err(Syntax)` for unterminated strings or brackets and stray characters
    pub fn next_token(&mut self) -> EngineResult<Token> {
        self.skip_whitespace();
        let pos = self.pos;

        if self.at_end() {
            return Ok(Token::new(TokenKind::Eof, "", pos));
        }

        match self.ch {
            '"' => {
                let literal = self.read_string(pos)?;
                Ok(Token::new(TokenKind::String, literal, pos))
            }
            '[' => {
                let literal = self.read_bracketed(pos)?;
                Ok(Token::new(TokenKind::Bracketed, literal, pos))
            }
            '#' => {
                self.read_char();
                let digits = self.read_while(|c| c.is_ascii_digit());
                if digits.is_empty() {
                    return Err(EngineError::syntax("expected a column number after '#'", pos));
                }
                Ok(Token::new(TokenKind::IndexRef, digits, pos))
            }
            '(' | ')' | ',' | '*' | ';' => {
                let c = self.ch;
                self.read_char();
                Ok(Token::new(TokenKind::Punctuator, c.to_string(), pos))
            }
            '<' | '>' | '=' | '!' => {
                let literal = self.read_operator(pos)?;
                Ok(Token::new(TokenKind::Operator, literal, pos))
            }
            c if is_word_char(c) => {
                let literal = self.read_while(is_word_char);
                let kind = if is_number(&literal) {
                    TokenKind::Number
                } else {
                    TokenKind::Word
                };
                Ok(Token::new(kind, literal, pos))
            }
            c => Err(EngineError::syntax(
                format!("unrecognized character {:?}", c),
                pos,
            )),
        }
    }

    /// Tokenize the whole input, ending with an EOF token
    pub fn tokenize(mut self) -> EngineResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.at_end() && self.ch.is_whitespace() {
            self.read_char();
        }
    }

    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut result = String::new();
        while !self.at_end() && accept(self.ch) {
            result.push(self.ch);
            self.read_char();
        }
        result
    }

    /// Read a double-quoted string; `\"` and `\\` are escapes
    fn read_string(&mut self, start: Position) -> EngineResult<String> {
        let mut result = String::new();
        self.read_char(); // opening quote

        loop {
            if self.at_end() {
                return Err(EngineError::syntax("unterminated string literal", start));
            }
            match self.ch {
                '"' => {
                    self.read_char();
                    return Ok(result);
                }
                '\\' if matches!(self.peek_char(), '"' | '\\') => {
                    self.read_char();
                    result.push(self.ch);
                    self.read_char();
                }
                c => {
                    result.push(c);
                    self.read_char();
                }
            }
        }
    }

    /// Read a bracket-quoted column name
    fn read_bracketed(&mut self, start: Position) -> EngineResult<String> {
        self.read_char(); // '['
        let result = self.read_while(|c| c != ']');
        if self.at_end() {
            return Err(EngineError::syntax("unterminated bracketed column name", start));
        }
        self.read_char(); // ']'
        Ok(result)
    }

    fn read_operator(&mut self, start: Position) -> EngineResult<String> {
        let first = self.ch;
        self.read_char();
        let second = self.ch;
        let literal = match (first, second) {
            ('<', '=') | ('<', '>') | ('>', '=') | ('!', '=') => {
                self.read_char();
                format!("{}{}", first, second)
            }
            ('!', _) => return Err(EngineError::syntax("expected '=' after '!'", start)),
            _ => first.to_string(),
        };
        Ok(literal)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn is_number(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit()) && text.parse::<f64>().is_ok()
}
