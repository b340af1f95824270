//! Configuration module for sheetql
//!
//! This module folds the parsed command line into one immutable structure that
//! is passed explicitly to the parts of the program that need it.

use std::path::{Path, PathBuf};

use crate::bindings::Bindings;
use crate::cli::SheetqlArgs;
use crate::error::EngineResult;

/// What the program does with the loaded sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Run the queries in order; with no queries the sheet is echoed
    Query(Vec<String>),

    /// Aggregate per group
    GroupBy {
        /// Locator of the key columns
        keys: String,
        /// Locator of the target columns; all non-key columns when absent
        columns: Option<String>,
        /// Comma separated aggregate function names
        aggregate: String,
    },

    /// Histogram of one column
    Histogram {
        /// Locator of the column
        column: String,
        /// Bin count rule
        bins: String,
    },
}

/// Application configuration
///
/// Created at startup from [`SheetqlArgs`]; nothing is read from global state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Whether to log debug output
    verbose: bool,

    /// Field separator given with -F
    field_separator: Option<String>,

    /// Missing-value sentinel
    missing: String,

    /// Placeholder values
    bindings: Bindings,

    /// Sampling seed
    seed: u64,

    /// Selected mode
    mode: Mode,

    /// Whether to write the final sheet back to the input file
    write: bool,

    /// The input file
    file: PathBuf,
}

impl AppConfig {
    /// Build the configuration from parsed arguments
    ///
    /// # Returns
    /// * `Ok(AppConfig)`
    /// * `Err(InvalidInput)` for a malformed `-D` definition
    pub fn from_args(args: &SheetqlArgs) -> EngineResult<Self> {
        let mut bindings = Bindings::new();
        for definition in &args.define {
            let (name, value) = Bindings::parse_definition(definition)?;
            bindings.insert(name, value);
        }

        let mode = if let Some(column) = &args.histogram {
            Mode::Histogram {
                column: column.clone(),
                bins: args.bins.clone(),
            }
        } else if let Some(keys) = &args.group_by {
            Mode::GroupBy {
                keys: keys.clone(),
                columns: args.columns.clone(),
                aggregate: args.aggregate.clone(),
            }
        } else {
            Mode::Query(args.query.clone())
        };

        Ok(Self {
            verbose: args.verbose,
            field_separator: args.field_separator.clone(),
            missing: args.missing.clone(),
            bindings,
            seed: args.seed,
            mode,
            write: args.write,
            file: args.file.clone(),
        })
    }

    /// Get the verbose flag
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Get the field separator
    pub fn field_separator(&self) -> Option<&str> {
        self.field_separator.as_deref()
    }

    /// Get the missing-value sentinel
    pub fn missing(&self) -> &str {
        &self.missing
    }

    /// Get the placeholder bindings
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Get the sampling seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the selected mode
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Get whether to write changes
    pub fn write(&self) -> bool {
        self.write
    }

    /// Get the input file
    pub fn file(&self) -> &Path {
        &self.file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn build(argv: &[&str]) -> EngineResult<AppConfig> {
        let args = SheetqlArgs::try_parse_from(argv).unwrap();
        AppConfig::from_args(&args)
    }

    #[test]
    fn test_query_mode_and_defaults() {
        let config = build(&["sheetql", "-q", "SELECT *", "-q", "DELETE", "data.csv"]).unwrap();
        assert_eq!(
            config.mode(),
            &Mode::Query(vec!["SELECT *".to_string(), "DELETE".to_string()])
        );
        assert_eq!(config.missing(), "?");
        assert_eq!(config.seed(), 1);
        assert_eq!(config.field_separator(), None);
        assert!(!config.write());
        assert_eq!(config.file(), Path::new("data.csv"));
    }

    #[test]
    fn test_group_by_and_histogram_modes() {
        let config = build(&["sheetql", "--group-by", "Dept", "--aggregate", "SUM,MEAN", "d.csv"]).unwrap();
        assert_eq!(
            config.mode(),
            &Mode::GroupBy {
                keys: "Dept".to_string(),
                columns: None,
                aggregate: "SUM,MEAN".to_string(),
            }
        );

        let config = build(&["sheetql", "--histogram", "Salary", "--bins", "4", "d.csv"]).unwrap();
        assert_eq!(
            config.mode(),
            &Mode::Histogram {
                column: "Salary".to_string(),
                bins: "4".to_string(),
            }
        );
    }

    #[test]
    fn test_definitions() {
        let config = build(&["sheetql", "-D", "dept=A", "-D", "min=5", "d.csv"]).unwrap();
        assert_eq!(config.bindings().get("dept"), Some("A"));
        assert_eq!(config.bindings().get("min"), Some("5"));
        assert!(build(&["sheetql", "-D", "broken", "d.csv"]).is_err());
    }
}
