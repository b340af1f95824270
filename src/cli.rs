//! CLI argument parsing module for sheetql
//!
//! This module defines the command-line interface with the clap crate. One
//! delimited file is loaded as a sheet and then either queried, aggregated per
//! group, or summarised as a histogram of one column.
//!
//! Key features of the CLI:
//! - Several queries per invocation, each seeing the previous one's output
//! - `@{name}` placeholders bound with -D
//! - Opt-in file modification with the --write flag
//! - Debug logging on stderr via the --verbose flag

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// Command-line arguments for sheetql
///
/// The CLI is non-destructive by default: the input file is only rewritten
/// when --write is given.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Grouping, aggregation and queries over delimiter-separated files"
)]
pub struct SheetqlArgs {
    /// Queries to run
    ///
    /// Queries run in sequence; each operates on the sheet left by the previous one.
    /// Example: -q 'DELETE WHERE Salary < 10' -q 'SELECT Dept, Salary ORDER BY Salary'
    #[clap(short, long, help = "Query to run (repeatable, run in order)")]
    pub query: Vec<String>,

    /// Specify field separator character
    ///
    /// Default is comma for .csv files and tab for other files.
    /// Examples: -F: for colon-separated files, -F\\t for tab-separated files.
    #[clap(short = 'F', help = "Field separator character")]
    pub field_separator: Option<String>,

    /// Text that marks a missing value in the input and output
    #[clap(long, default_value = "?", help = "Missing-value sentinel")]
    pub missing: String,

    /// Placeholder bindings - format: NAME=VALUE
    ///
    /// Every `@{NAME}` in a query is replaced by VALUE before parsing.
    #[clap(short = 'D', long, help = "Placeholder binding as NAME=VALUE")]
    pub define: Vec<String>,

    /// Seed for `SELECT <n>` sampling
    #[clap(long, default_value_t = 1, help = "Sampling seed")]
    pub seed: u64,

    /// Key columns; aggregates per group instead of running queries
    ///
    /// Accepts names, `[name]`, `#n`, positions, ranges and `inv(...)`.
    #[clap(long, help = "Aggregate per group of these key columns")]
    pub group_by: Option<String>,

    /// Target columns for --group-by (default: all non-key columns)
    #[clap(long, requires = "group_by", help = "Target columns for --group-by")]
    pub columns: Option<String>,

    /// Comma separated aggregate functions for --group-by
    #[clap(
        long,
        default_value = "COUNT",
        help = "Aggregate functions for --group-by, e.g. SUM,MEAN"
    )]
    pub aggregate: String,

    /// Print a histogram of one column instead of running queries
    #[clap(long, conflicts_with = "group_by", help = "Print a histogram of this column")]
    pub histogram: Option<String>,

    /// Bin count rule for --histogram: sturges, scott, sqrt or a number
    #[clap(long, default_value = "sturges", help = "Bin rule: sturges|scott|sqrt|<count>")]
    pub bins: String,

    /// Enable debug logging on stderr
    #[clap(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Write the final sheet back to the input file (default is to not modify it)
    #[clap(short = 'w', long, help = "Write changes back to the input file")]
    pub write: bool,

    /// Input file
    #[clap(required = true, help = "Input file")]
    pub file: PathBuf,
}

/// Parse command-line arguments into the SheetqlArgs structure
///
/// # Returns
/// * `Ok(SheetqlArgs)` - Command-line arguments successfully parsed
/// * `Err` - Error during argument parsing (handled by clap, usually results in help text display)
pub fn parse_args() -> Result<SheetqlArgs> {
    Ok(SheetqlArgs::parse())
}
