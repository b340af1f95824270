//! Error handling for sheetql
//!
//! This module defines the error types returned by the engine. Every failure is
//! returned as a value so callers can report it without unwinding. The only
//! conditions that are not errors are the documented fallbacks: a comparison that
//! cannot be resolved numerically degrades to string comparison (logged as a
//! [`TypeCoercionWarning`]) and an aggregate over an empty group yields a missing
//! cell.

use std::fmt;

use thiserror::Error;

use crate::cell::ContentType;

/// A position in query text
///
/// Line and column start at 1, the byte offset at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset into the query text
    pub offset: usize,
    /// Line number, starting at 1
    pub line: usize,
    /// Column number, starting at 1
    pub column: usize,
}

impl Position {
    /// Create a new position
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A cell could not be represented as the requested type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot coerce {from} cell to {to}")]
pub struct CoercionError {
    /// Runtime type of the cell that was coerced
    pub from: ContentType,
    /// Name of the requested target type
    pub to: &'static str,
}

impl CoercionError {
    pub(crate) fn new(from: ContentType, to: &'static str) -> Self {
        Self { from, to }
    }
}

/// EngineError represents all failures the engine reports
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed query text
    #[error("Syntax error at {position}: {message}")]
    Syntax {
        /// Human-readable description
        message: String,
        /// Where in the query text the problem was found
        position: Position,
    },

    /// A column reference or aggregate target could not be resolved against a sheet
    #[error("Bind error: {0}")]
    Bind(String),

    /// Invalid arguments to an engine operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A sheet header would contain the same column name twice
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// A `@{name}` placeholder without a binding
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    /// A cell could not be converted to the requested type
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// Cooperative cancellation was observed mid-evaluation
    #[error("Evaluation cancelled")]
    Cancelled,

    /// Error during file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while reading or writing delimited data
    #[error("File parsing error: {0}")]
    Csv(#[from] csv::Error),
}

impl EngineError {
    /// Build a syntax error at the given position
    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        EngineError::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Build a bind error for a column that does not exist
    pub fn unknown_column(name: impl fmt::Display) -> Self {
        EngineError::Bind(format!("Column '{}' not found", name))
    }
}

/// Result type alias for operations that can produce an EngineError
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// A comparison fell back to string comparison
///
/// This is never returned as an error. The evaluator logs it at debug level and
/// carries on with the string comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCoercionWarning {
    /// Content string of the left operand
    pub left: String,
    /// Content string of the right operand
    pub right: String,
}

impl fmt::Display for TypeCoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "comparing '{}' with '{}' as strings (operands are not both numeric)",
            self.left, self.right
        )
    }
}
