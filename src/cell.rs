//! Cell module for sheetql
//!
//! This module provides the typed value stored in a spreadsheet cell. Cells are
//! a closed set of variants, so every conversion and comparison below is an
//! exhaustive match over [`CellValue`]:
//!
//! - Type inference for text loaded from delimiter-separated files
//! - Coercion to numeric, boolean and temporal types via [`Coercible`]
//! - The content-string rendering used for grouping keys and `REGEXP`
//! - Mixed-type comparison shared by sorting and query conditions

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoercionError;

/// Textual sentinel for a missing cell unless a sheet overrides it
pub const DEFAULT_MISSING: &str = "?";

/// Format used to render and parse date cells
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used to render and parse time cells
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Format used to render date/time cells
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Additional formats accepted when parsing date/time text
const DATETIME_INPUT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Runtime type of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// Explicitly missing value
    Missing,
    /// Text, including text forced to string even when it looks numeric
    String,
    /// true/false
    Boolean,
    /// 64-bit signed integer
    Long,
    /// 64-bit floating point number
    Double,
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// Date and time of day
    DateTime,
}

impl ContentType {
    /// Canonical lower-case name, as used by `CELLTYPE(col) = "kind"`
    pub fn name(&self) -> &'static str {
        match self {
            ContentType::Missing => "missing",
            ContentType::String => "string",
            ContentType::Boolean => "boolean",
            ContentType::Long => "long",
            ContentType::Double => "double",
            ContentType::Date => "date",
            ContentType::Time => "time",
            ContentType::DateTime => "datetime",
        }
    }

    /// Check whether a kind name from query text denotes this type
    ///
    /// Matching is case-insensitive. `bool` and `timestamp` are accepted as
    /// aliases and `numeric` matches both `long` and `double`.
    pub fn matches_name(&self, kind: &str) -> bool {
        let kind = kind.trim().to_lowercase();
        match kind.as_str() {
            "numeric" => matches!(self, ContentType::Long | ContentType::Double),
            "bool" => *self == ContentType::Boolean,
            "timestamp" => *self == ContentType::DateTime,
            other => self.name() == other,
        }
    }

    /// Whether `kind` is a name accepted by [`ContentType::matches_name`]
    pub fn is_known_name(kind: &str) -> bool {
        let kind = kind.trim().to_lowercase();
        matches!(
            kind.as_str(),
            "missing"
                | "string"
                | "boolean"
                | "bool"
                | "long"
                | "double"
                | "numeric"
                | "date"
                | "time"
                | "datetime"
                | "timestamp"
        )
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents a value in a sheet cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CellValue {
    /// The missing-value sentinel, distinct from zero and from the empty string
    Missing,
    /// UTF-8 string
    String(String),
    /// Boolean value (true/false)
    Boolean(bool),
    /// 64-bit signed integer
    Long(i64),
    /// 64-bit floating point number
    Double(f64),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Date and time of day
    DateTime(NaiveDateTime),
}

/// Structural equality: same variant and same content
///
/// Two NaN doubles are equal here so that a copied sheet compares equal to its
/// source. Mixed-type comparison for queries goes through [`CellValue::compare`].
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Missing, CellValue::Missing) => true,
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Boolean(a), CellValue::Boolean(b)) => a == b,
            (CellValue::Long(a), CellValue::Long(b)) => a == b,
            (CellValue::Double(a), CellValue::Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::Time(a), CellValue::Time(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

/// Content rendering; Missing renders as the default sentinel
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => f.write_str(DEFAULT_MISSING),
            CellValue::String(s) => f.write_str(s),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Long(i) => write!(f, "{}", i),
            CellValue::Double(d) => write!(f, "{}", d),
            CellValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            CellValue::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::infer(s, DEFAULT_MISSING)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Long(i)
    }
}

impl From<f64> for CellValue {
    fn from(d: f64) -> Self {
        CellValue::Double(d)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Outcome of comparing two non-missing cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellOrdering {
    /// Relative order of the left operand
    pub ordering: Ordering,
    /// True if one side was numeric and the other was not, so the cells were
    /// compared as strings
    pub string_fallback: bool,
}

impl CellValue {
    /// Infer a typed cell from text
    ///
    /// The text equal to `missing` becomes [`CellValue::Missing`]. Otherwise the
    /// text is tried as an integer, a floating point number, a boolean, a
    /// date/time, a date and a time, in that order, before falling back to a
    /// string.
    pub fn infer(text: &str, missing: &str) -> Self {
        if text == missing {
            return CellValue::Missing;
        }

        if let Ok(i) = text.parse::<i64>() {
            return CellValue::Long(i);
        }

        // f64 parsing accepts "inf" and "NaN", which should stay text
        if text.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(d) = text.parse::<f64>() {
                return CellValue::Double(d);
            }
        }

        if text.eq_ignore_ascii_case("true") {
            return CellValue::Boolean(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return CellValue::Boolean(false);
        }

        if let Some(dt) = parse_datetime(text) {
            return CellValue::DateTime(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
            return CellValue::Date(d);
        }
        if let Ok(t) = NaiveTime::parse_from_str(text, TIME_FORMAT) {
            return CellValue::Time(t);
        }

        CellValue::String(text.to_string())
    }

    /// Runtime type of this cell
    pub fn content_type(&self) -> ContentType {
        match self {
            CellValue::Missing => ContentType::Missing,
            CellValue::String(_) => ContentType::String,
            CellValue::Boolean(_) => ContentType::Boolean,
            CellValue::Long(_) => ContentType::Long,
            CellValue::Double(_) => ContentType::Double,
            CellValue::Date(_) => ContentType::Date,
            CellValue::Time(_) => ContentType::Time,
            CellValue::DateTime(_) => ContentType::DateTime,
        }
    }

    /// Whether this cell is the missing sentinel
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Whether this cell holds a Long or Double
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Long(_) | CellValue::Double(_))
    }

    /// The value of a Long or Double cell, excluding NaN
    ///
    /// This is the filter applied before handing a column to an aggregate
    /// reducer: strings are not parsed, even when their text looks numeric.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            CellValue::Long(i) => Some(*i as f64),
            CellValue::Double(d) if !d.is_nan() => Some(*d),
            _ => None,
        }
    }

    /// Whether this cell holds a date, time or date/time
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            CellValue::Date(_) | CellValue::Time(_) | CellValue::DateTime(_)
        )
    }

    /// Render the cell, using `missing` for the missing sentinel
    pub fn display_with(&self, missing: &str) -> String {
        match self {
            CellValue::Missing => missing.to_string(),
            other => other.to_string(),
        }
    }

    /// Compare two cells with the permissive typing used by queries and sorting
    ///
    /// Returns `None` if either cell is missing, or if both are numeric and one
    /// is NaN. Numbers compare numerically when both sides parse as numbers, with
    /// integers compared exactly; temporal cells compare chronologically against
    /// cells of the same kind or against strings that parse as that kind;
    /// booleans compare false < true; everything else compares by content string.
    pub fn compare(&self, other: &CellValue) -> Option<CellOrdering> {
        if self.is_missing() || other.is_missing() {
            return None;
        }

        let exact = |ordering: Ordering| {
            Some(CellOrdering {
                ordering,
                string_fallback: false,
            })
        };

        if let (CellValue::Boolean(a), CellValue::Boolean(b)) = (self, other) {
            return exact(a.cmp(b));
        }

        if self.is_temporal() || other.is_temporal() {
            let ordering = match (self, other) {
                (CellValue::DateTime(_), _) | (_, CellValue::DateTime(_)) => self
                    .to_datetime()
                    .and_then(|a| other.to_datetime().map(|b| a.cmp(&b))),
                (CellValue::Date(_), _) | (_, CellValue::Date(_)) => self
                    .to_date()
                    .and_then(|a| other.to_date().map(|b| a.cmp(&b))),
                _ => self
                    .to_time()
                    .and_then(|a| other.to_time().map(|b| a.cmp(&b))),
            };
            if let Ok(ordering) = ordering {
                return exact(ordering);
            }
        }

        let left_number = Number::of(self);
        let right_number = Number::of(other);
        if let (Some(a), Some(b)) = (left_number, right_number) {
            return a.compare(b).map(|ordering| CellOrdering {
                ordering,
                string_fallback: false,
            });
        }

        Some(CellOrdering {
            ordering: self.to_string().cmp(&other.to_string()),
            string_fallback: left_number.is_some() != right_number.is_some(),
        })
    }
}

/// Total order for sorting, where absent and missing cells sort first
///
/// Present cells are ranked by class first: numbers (including numeric text),
/// booleans, dates and date/times, times, other text, then NaN. Cells of the
/// same class compare by value.
pub fn compare_for_sort(a: Option<&CellValue>, b: Option<&CellValue>) -> Ordering {
    let a = a.filter(|c| !c.is_missing());
    let b = b.filter(|c| !c.is_missing());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let (class_a, class_b) = (SortClass::of(a), SortClass::of(b));
            if class_a != class_b {
                return class_a.cmp(&class_b);
            }
            match class_a {
                SortClass::Number => match (Number::of(a), Number::of(b)) {
                    (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                },
                SortClass::Boolean | SortClass::Date | SortClass::Time => a
                    .compare(b)
                    .map_or(Ordering::Equal, |c| c.ordering),
                SortClass::Text => a.to_string().cmp(&b.to_string()),
                SortClass::NaN => Ordering::Equal,
            }
        }
    }
}

/// Rank of a present cell in the sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SortClass {
    Number,
    Boolean,
    Date,
    Time,
    Text,
    NaN,
}

impl SortClass {
    fn of(cell: &CellValue) -> Self {
        match cell {
            CellValue::Double(d) if d.is_nan() => SortClass::NaN,
            CellValue::Boolean(_) => SortClass::Boolean,
            CellValue::Date(_) | CellValue::DateTime(_) => SortClass::Date,
            CellValue::Time(_) => SortClass::Time,
            other => match Number::of(other) {
                Some(Number::Float(f)) if f.is_nan() => SortClass::NaN,
                Some(_) => SortClass::Number,
                None => SortClass::Text,
            },
        }
    }
}

/// A numeric cell value, keeping integers exact
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Numeric view of a Long, Double or numeric string cell
    fn of(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Long(i) => Some(Number::Int(*i)),
            CellValue::Double(d) => Some(Number::Float(*d)),
            CellValue::String(s) => match s.trim().parse::<i64>() {
                Ok(i) => Some(Number::Int(i)),
                Err(_) => parse_number(s).map(Number::Float),
            },
            _ => None,
        }
    }

    /// Exact comparison; `None` if either side is NaN
    fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
            (Number::Int(a), Number::Float(b)) => compare_int_float(a, b),
            (Number::Float(a), Number::Int(b)) => compare_int_float(b, a).map(Ordering::reverse),
        }
    }
}

/// Compare an integer with a double without rounding the integer
fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    // 2^63 is exactly representable; i64::MAX is not
    if float >= 9_223_372_036_854_775_808.0 {
        return Some(Ordering::Less);
    }
    if float < -9_223_372_036_854_775_808.0 {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        ordering => Some(ordering),
    }
}

/// Conversions a cell supports
///
/// Each conversion fails only when the variant cannot represent the target. A
/// string cell coerces whenever its text parses as the target type, which is how
/// forced-string cells holding numeric text still take part in arithmetic.
pub trait Coercible {
    /// Numeric value
    fn to_double(&self) -> Result<f64, CoercionError>;
    /// Integer value; doubles must be finite and are truncated
    fn to_long(&self) -> Result<i64, CoercionError>;
    /// Boolean value
    fn to_boolean(&self) -> Result<bool, CoercionError>;
    /// Calendar date; date/time cells drop their time part
    fn to_date(&self) -> Result<NaiveDate, CoercionError>;
    /// Time of day; date/time cells drop their date part
    fn to_time(&self) -> Result<NaiveTime, CoercionError>;
    /// Date and time; date cells are taken at midnight
    fn to_datetime(&self) -> Result<NaiveDateTime, CoercionError>;
    /// The string content used for grouping keys and regular expressions
    fn to_content_string(&self) -> Result<String, CoercionError>;
}

impl Coercible for CellValue {
    fn to_double(&self) -> Result<f64, CoercionError> {
        match self {
            CellValue::Long(i) => Ok(*i as f64),
            CellValue::Double(d) => Ok(*d),
            CellValue::String(s) => parse_number(s).ok_or(CoercionError::new(ContentType::String, "double")),
            other => Err(CoercionError::new(other.content_type(), "double")),
        }
    }

    fn to_long(&self) -> Result<i64, CoercionError> {
        match self {
            CellValue::Long(i) => Ok(*i),
            CellValue::Double(d) if d.is_finite() => Ok(d.trunc() as i64),
            CellValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| CoercionError::new(ContentType::String, "long")),
            other => Err(CoercionError::new(other.content_type(), "long")),
        }
    }

    fn to_boolean(&self) -> Result<bool, CoercionError> {
        match self {
            CellValue::Boolean(b) => Ok(*b),
            CellValue::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            CellValue::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            other => Err(CoercionError::new(other.content_type(), "boolean")),
        }
    }

    fn to_date(&self) -> Result<NaiveDate, CoercionError> {
        match self {
            CellValue::Date(d) => Ok(*d),
            CellValue::DateTime(dt) => Ok(dt.date()),
            CellValue::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .ok()
                .or_else(|| parse_datetime(s.trim()).map(|dt| dt.date()))
                .ok_or(CoercionError::new(ContentType::String, "date")),
            other => Err(CoercionError::new(other.content_type(), "date")),
        }
    }

    fn to_time(&self) -> Result<NaiveTime, CoercionError> {
        match self {
            CellValue::Time(t) => Ok(*t),
            CellValue::DateTime(dt) => Ok(dt.time()),
            CellValue::String(s) => NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
                .map_err(|_| CoercionError::new(ContentType::String, "time")),
            other => Err(CoercionError::new(other.content_type(), "time")),
        }
    }

    fn to_datetime(&self) -> Result<NaiveDateTime, CoercionError> {
        match self {
            CellValue::DateTime(dt) => Ok(*dt),
            CellValue::Date(d) => d
                .and_hms_opt(0, 0, 0)
                .ok_or(CoercionError::new(ContentType::Date, "datetime")),
            CellValue::String(s) => parse_datetime(s.trim())
                .or_else(|| {
                    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .ok_or(CoercionError::new(ContentType::String, "datetime")),
            other => Err(CoercionError::new(other.content_type(), "datetime")),
        }
    }

    fn to_content_string(&self) -> Result<String, CoercionError> {
        match self {
            CellValue::Missing => Err(CoercionError::new(ContentType::Missing, "string")),
            other => Ok(other.to_string()),
        }
    }
}

/// Parse text as a number, requiring at least one digit
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Parse text as a date/time in any of the accepted input formats
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}
