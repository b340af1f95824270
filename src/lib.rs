//! sheetql library crate
//!
//! This is the library component of sheetql: a grouping, aggregation and query
//! engine for in-memory spreadsheets. The library provides:
//!
//! - Typed cells with inference from text and a missing-value sentinel
//! - Sheets with sparse rows, stable multi-column sorting and projection
//! - A row-grouping primitive keyed on any combination of columns
//! - A library of statistical aggregate functions
//! - A small query language (`SELECT`, `UPDATE`, `DELETE` with `WHERE`,
//!   `ORDER BY`, `LIMIT`, `GROUP BY` and `HAVING`)
//! - Per-group operations and histograms outside the query language
//! - Loading and saving delimiter-separated files
//!
//! ```
//! use sheetql::{evaluate, Bindings, CellValue, Sheet};
//!
//! let mut sheet = Sheet::new(vec!["Dept".to_string(), "Salary".to_string()]).unwrap();
//! sheet.push_values(vec![CellValue::from("A"), CellValue::Long(10)]).unwrap();
//! sheet.push_values(vec![CellValue::from("A"), CellValue::Long(30)]).unwrap();
//!
//! let result = evaluate(&sheet, "SELECT SUM(Salary) GROUP BY Dept", &Bindings::new()).unwrap();
//! assert_eq!(result.columns(), &["Dept".to_string(), "SUM(Salary)".to_string()]);
//! assert_eq!(result.cell(0, 1), Some(&CellValue::Double(40.0)));
//! ```

pub mod aggregate;
pub mod bindings;
pub mod binning;
pub mod cancel;
pub mod cell;
pub mod cli;
pub mod config;
pub mod csv_handler;
pub mod error;
pub mod grouping;
pub mod locator;
pub mod ops;
pub mod query;
pub mod sheet;

pub use aggregate::AggregateFunction;
pub use bindings::Bindings;
pub use binning::{Bin, BinCountRule, BinningAlgorithm, DensityBinning, EqualWidthBinning, FixedWidthBinning};
pub use cancel::CancelToken;
pub use cell::{CellValue, Coercible, ContentType};
pub use error::{CoercionError, EngineError, EngineResult, Position, TypeCoercionWarning};
pub use grouping::{group_rows, EmptyKeyPolicy, GroupKey, GroupMode, GroupOptions, Grouping};
pub use locator::{resolve_columns, ColumnLocator};
pub use query::{evaluate, evaluate_copy, evaluate_in_place, EvalOptions, Query};
pub use sheet::{Header, Row, Sheet, SortDirection};
