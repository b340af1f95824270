//! Query language for sheetql
//!
//! A query is a list of `SELECT`, `UPDATE` and `DELETE` statements evaluated in
//! order against a sheet:
//!
//! ```text
//! SELECT Dept, Salary WHERE Salary > 15 ORDER BY Salary DESC LIMIT 10
//! SELECT SUM(Salary) AS Total GROUP BY Dept HAVING Total > 100
//! UPDATE SET Salary = 0 WHERE Dept = "A"
//! DELETE WHERE [Start Date] < PARSE("date", "2020-01-01")
//! ```
//!
//! [`Query::parse`] builds an immutable AST that can be evaluated against any
//! sheet with compatible columns; [`evaluate_copy`] and [`evaluate_in_place`]
//! run it.

pub mod ast;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod token;

use std::str::FromStr;

pub use evaluator::{evaluate_copy, evaluate_in_place, EvalOptions};

use crate::bindings::Bindings;
use crate::error::{EngineError, EngineResult};
use crate::sheet::Sheet;
use ast::Statement;
use parser::Parser;

/// A parsed query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    text: String,
    statements: Vec<Statement>,
}

impl Query {
    /// Parse query text
    ///
    /// # Returns
    /// * `Ok(Query)` holding at least one statement
    /// * `Err(Syntax)` with the position of the problem
    pub fn parse(text: &str) -> EngineResult<Self> {
        let statements = Parser::new(text)?.parse_statements()?;
        Ok(Query {
            text: text.to_string(),
            statements,
        })
    }

    /// The text the query was parsed from
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The statements, in evaluation order
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

impl FromStr for Query {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::parse(s)
    }
}

/// Expand placeholders, parse and evaluate a query against a copy of `sheet`
///
/// This is the one-call entry point; it uses default [`EvalOptions`]. Parse a
/// [`Query`] once and call [`evaluate_copy`] to reuse it across sheets.
///
/// # Arguments
/// * `sheet` - The input sheet; it is not modified
/// * `text` - Query text, possibly containing `@{name}` placeholders
/// * `bindings` - Values for the placeholders
pub fn evaluate(sheet: &Sheet, text: &str, bindings: &Bindings) -> EngineResult<Sheet> {
    let expanded = bindings.expand(text)?;
    let query = Query::parse(&expanded)?;
    evaluate_copy(sheet, &query, &EvalOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    #[test]
    fn test_evaluate_with_bindings() {
        let mut sheet = Sheet::new(vec!["Dept".to_string(), "Salary".to_string()]).unwrap();
        sheet
            .push_values(vec![CellValue::from("A"), CellValue::Long(10)])
            .unwrap();
        sheet
            .push_values(vec![CellValue::from("B"), CellValue::Long(20)])
            .unwrap();

        let mut bindings = Bindings::new();
        bindings.insert("dept", "B");
        let result = evaluate(&sheet, "SELECT Salary WHERE Dept = \"@{dept}\"", &bindings).unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.cell(0, 0), Some(&CellValue::Long(20)));

        assert!(matches!(
            evaluate(&sheet, "SELECT @{missing}", &bindings),
            Err(EngineError::UnknownVariable(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_query_from_str() {
        let query: Query = "DELETE".parse().unwrap();
        assert_eq!(query.statements().len(), 1);
        assert_eq!(query.text(), "DELETE");
    }
}
