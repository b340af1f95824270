//! Abstract syntax tree for queries
//!
//! A parsed query is immutable and independent of any sheet; column references
//! stay symbolic until the evaluator binds them against a header.

use std::fmt;

use regex::Regex;

use crate::aggregate::AggregateFunction;
use crate::cell::CellValue;
use crate::sheet::SortDirection;

/// A column reference as written in the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Bare or bracketed column name
    Name(String),
    /// `#n`, stored 0-based
    Index(usize),
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Name(name) => write!(f, "{}", name),
            ColumnRef::Index(idx) => write!(f, "#{}", idx + 1),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl CompareOp {
    /// Parse an operator token
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            "=" => Some(CompareOp::Eq),
            "<>" | "!=" => Some(CompareOp::Ne),
            ">=" => Some(CompareOp::Ge),
            ">" => Some(CompareOp::Gt),
            _ => None,
        }
    }

    /// Whether an ordering of the left operand against the right satisfies the operator
    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Ge => ordering != Less,
            CompareOp::Gt => ordering == Greater,
        }
    }
}

/// Target type of `PARSE(kind, text)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseKind {
    /// Long if the text is an integer, Double otherwise
    Number,
    Long,
    Double,
    Boolean,
    String,
    Date,
    Time,
    DateTime,
}

impl ParseKind {
    /// Look up a kind by name (case-insensitive); `timestamp` is a synonym of `datetime`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "number" | "numeric" => Some(ParseKind::Number),
            "long" => Some(ParseKind::Long),
            "double" => Some(ParseKind::Double),
            "boolean" | "bool" => Some(ParseKind::Boolean),
            "string" => Some(ParseKind::String),
            "date" => Some(ParseKind::Date),
            "time" => Some(ParseKind::Time),
            "datetime" | "timestamp" => Some(ParseKind::DateTime),
            _ => None,
        }
    }
}

/// A value on the right-hand side of a comparison or assignment
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// Numeric literal, held as a Long or Double cell
    Number(CellValue),
    /// Double-quoted string literal
    String(String),
    /// `TRUE` or `FALSE`
    Boolean(bool),
    /// The same row's value in another column
    Column(ColumnRef),
    /// `PARSE(kind, text)`, converted when the query is parsed
    Parse {
        kind: ParseKind,
        text: String,
        value: CellValue,
    },
}

/// A compiled `REGEXP` pattern that must match the whole content string
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The pattern as written in the query
    pub source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern anchored at both ends
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Pattern {
            source: source.to_string(),
            regex: Regex::new(&format!("^(?:{})$", source))?,
        })
    }

    /// Whether the pattern matches all of `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Boolean expression evaluated per row
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `col <op> value`
    Compare {
        column: ColumnRef,
        op: CompareOp,
        value: ValueExpr,
    },
    /// `col REGEXP "pattern"`
    Regexp { column: ColumnRef, pattern: Pattern },
    /// `col IS NULL`
    IsNull(ColumnRef),
    /// `CELLTYPE(col) = "kind"`
    CellType { column: ColumnRef, kind: String },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

/// One item of a plain SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*`, every column of the input
    All,
    /// `col` or `col AS alias`
    Column {
        column: ColumnRef,
        alias: Option<String>,
    },
}

/// `SELECT <n>`: keep a random subset of rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampling {
    /// Keep this many rows
    Count(usize),
    /// Keep this share of the rows, `0 < f < 1`
    Fraction(f64),
}

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// `LIMIT [offset,] max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Rows skipped first, 0-based
    pub offset: usize,
    /// Maximum number of rows kept
    pub max: usize,
}

/// Row-level SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub items: Vec<SelectItem>,
    pub sample: Option<Sampling>,
    pub where_clause: Option<Condition>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
}

/// What an aggregate is computed over
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateTarget {
    /// `*`, only valid for COUNT
    AllRows,
    Column(ColumnRef),
}

/// `FUNC(target) [AS alias]`
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateItem {
    pub function: AggregateFunction,
    pub target: AggregateTarget,
    pub alias: Option<String>,
}

/// Aggregating SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct SelectAggregate {
    pub aggregates: Vec<AggregateItem>,
    pub where_clause: Option<Condition>,
    pub group_by: Vec<ColumnRef>,
    pub having: Option<Condition>,
}

/// `col = value` in an UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: ColumnRef,
    pub value: ValueExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub where_clause: Option<Condition>,
}

/// A single query statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    SelectAggregate(SelectAggregate),
    Update(Update),
    Delete(Delete),
}

impl Statement {
    /// Statement keyword, for log messages
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Select(_) | Statement::SelectAggregate(_) => "SELECT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
        }
    }
}
