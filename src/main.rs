//! sheetql - grouping, aggregation and queries over delimiter-separated files
//!
//! This tool loads one delimited file into memory as a sheet and then does one
//! of three things with it:
//!
//! - runs a sequence of queries (`SELECT`, `UPDATE`, `DELETE`), each on the
//!   output of the previous one
//! - aggregates target columns per group of key columns (`--group-by`)
//! - prints a histogram of one column (`--histogram`)
//!
//! # Program Flow
//!
//! 1. Parse command-line arguments
//! 2. Load the file into a sheet
//! 3. Transform the sheet according to the selected mode
//! 4. Print the result to stdout
//! 5. Save the result back to the file if requested

use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, LevelFilter};

use sheetql::aggregate::AggregateFunction;
use sheetql::binning::{BinCountRule, EqualWidthBinning};
use sheetql::cancel::CancelToken;
use sheetql::cli;
use sheetql::config::{AppConfig, Mode};
use sheetql::csv_handler::CsvHandler;
use sheetql::locator::resolve_columns;
use sheetql::ops;
use sheetql::query::{evaluate_in_place, EvalOptions, Query};
use sheetql::sheet::Sheet;

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {}", e))
}

/// Main entry point for the sheetql utility
///
/// # Returns
/// * `Ok(())` if all operations completed successfully
/// * `Err` with context if any step fails
fn main() -> Result<()> {
    // Step 1: Parse command-line arguments
    let args = cli::parse_args()?;
    let config = AppConfig::from_args(&args).context("Invalid arguments")?;
    init_logging(config.verbose())?;
    debug!("Arguments: {args:?}");

    // Step 2: Load the input file
    let handler = CsvHandler::for_path(config.file(), config.field_separator(), config.missing())?;
    let sheet = handler
        .load_sheet(config.file())
        .with_context(|| format!("Failed to load file: {}", config.file().display()))?;

    // Step 3: Transform according to the mode
    let result = match config.mode() {
        Mode::Query(queries) => run_queries(sheet, queries, &config)?,
        Mode::GroupBy {
            keys,
            columns,
            aggregate,
        } => run_group_by(&sheet, keys, columns.as_deref(), aggregate)?,
        Mode::Histogram { column, bins } => run_histogram(&sheet, column, bins)?,
    };
    debug!("Result has {} row(s)", result.row_count());

    // Step 4: Print the result
    handler
        .write_sheet(&result, io::stdout().lock())
        .context("Failed to write result")?;

    // Step 5: Write back only when asked to
    if config.write() {
        handler
            .save_sheet(&result, config.file())
            .with_context(|| format!("Failed to save file: {}", config.file().display()))?;
    } else {
        debug!("Changes not saved: use --write to save changes to the file");
    }

    Ok(())
}

/// Run each query on the output of the previous one
fn run_queries(mut sheet: Sheet, queries: &[String], config: &AppConfig) -> Result<Sheet> {
    let options = EvalOptions {
        cancel: CancelToken::new(),
        seed: config.seed(),
    };
    for text in queries {
        debug!("Executing query: {text}");
        let expanded = config
            .bindings()
            .expand(text)
            .with_context(|| format!("Failed to expand query: {text}"))?;
        let query = Query::parse(&expanded).with_context(|| format!("Failed to parse query: {expanded}"))?;
        evaluate_in_place(&mut sheet, &query, &options)
            .with_context(|| format!("Failed to execute query: {expanded}"))?;
    }
    Ok(sheet)
}

fn run_group_by(sheet: &Sheet, keys: &str, columns: Option<&str>, aggregate: &str) -> Result<Sheet> {
    let keys = resolve_columns(keys, sheet.header()).context("Invalid --group-by columns")?;
    let targets = match columns {
        Some(text) => resolve_columns(text, sheet.header()).context("Invalid --columns")?,
        None => (0..sheet.column_count())
            .filter(|col| !keys.contains(col))
            .collect(),
    };
    let functions = aggregate
        .split(',')
        .map(|name| {
            AggregateFunction::from_name(name.trim())
                .ok_or_else(|| anyhow!("Unknown aggregate function '{}'", name.trim()))
        })
        .collect::<Result<Vec<_>>>()?;

    ops::aggregate_by_group(sheet, &keys, &targets, &functions, &CancelToken::new())
        .context("Failed to aggregate groups")
}

fn run_histogram(sheet: &Sheet, column: &str, bins: &str) -> Result<Sheet> {
    let col = match resolve_columns(column, sheet.header())
        .context("Invalid --histogram column")?
        .as_slice()
    {
        [col] => *col,
        _ => bail!("--histogram needs exactly one column, got '{}'", column),
    };
    let rule: BinCountRule = bins.parse().context("Invalid --bins")?;
    ops::histogram(sheet, col, &EqualWidthBinning::new(rule)).context("Failed to build histogram")
}
