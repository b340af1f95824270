//! Per-group sheet operations
//!
//! These operations sit beside the query language and share its grouping
//! contract: per-group aggregation, splitting a sheet into one subset per key,
//! collapsing each group into a single row, and the histogram of one column.

use log::debug;

use crate::aggregate::AggregateFunction;
use crate::binning::BinningAlgorithm;
use crate::cancel::CancelToken;
use crate::cell::CellValue;
use crate::error::{EngineError, EngineResult};
use crate::grouping::{group_rows, EmptyKeyPolicy, GroupKey, GroupMode, GroupOptions};
use crate::sheet::{Row, Sheet};

/// Aggregate target columns per group
///
/// The result has one row per group (first-seen order): the key columns,
/// followed by one column per target and function named `col-FUNC`. With no key
/// columns the whole sheet is aggregated as a single group.
///
/// # Arguments
/// * `sheet` - Input sheet
/// * `keys` - 0-based key column indices
/// * `targets` - 0-based columns to aggregate
/// * `functions` - Reducers applied to every target
/// * `cancel` - Polled between groups
pub fn aggregate_by_group(
    sheet: &Sheet,
    keys: &[usize],
    targets: &[usize],
    functions: &[AggregateFunction],
    cancel: &CancelToken,
) -> EngineResult<Sheet> {
    if functions.is_empty() {
        return Err(EngineError::InvalidInput(
            "At least one aggregate function is required".to_string(),
        ));
    }

    let mut names = key_names(sheet, keys)?;
    for &target in targets {
        let name = column_name(sheet, target)?;
        for function in functions {
            names.push(format!("{}-{}", name, function.name()));
        }
    }

    let options = GroupOptions {
        mode: GroupMode::Streaming,
        empty_keys: EmptyKeyPolicy::WholeSheet,
    };
    let grouping = group_rows(sheet, keys, &options, cancel)?;
    debug!("Aggregating {} group(s) over {} column(s)", grouping.len(), targets.len());

    let mut result = sheet.derive(names)?;
    for (_, members) in grouping.iter() {
        cancel.check()?;
        let mut row = key_cells(sheet, keys, members);
        let mut col = keys.len();
        for &target in targets {
            let values: Vec<f64> = members
                .iter()
                .filter_map(|&r| sheet.cell(r, target))
                .filter_map(CellValue::numeric_value)
                .collect();
            for function in functions {
                row.set(col, function.compute_cell(&values));
                col += 1;
            }
        }
        result.add_row(row)?;
    }
    Ok(result)
}

/// Split a sheet into one subset per group
///
/// Each subset keeps all columns and the rows of one group, in the order the
/// grouping mode produces them.
pub fn split_by_group(
    sheet: &Sheet,
    keys: &[usize],
    mode: GroupMode,
    cancel: &CancelToken,
) -> EngineResult<Vec<(GroupKey, Sheet)>> {
    let grouping = group_rows(sheet, keys, &GroupOptions::with_mode(mode), cancel)?;
    debug!("Splitting {} row(s) into {} subset(s)", sheet.row_count(), grouping.len());
    grouping
        .into_iter()
        .map(|(key, members)| {
            cancel.check()?;
            Ok((key, sheet.take_rows(&members)))
        })
        .collect()
}

/// Collapse each group into a single row
///
/// Key columns keep the group's first cell. Every other column joins the
/// distinct content strings of the group with `separator`, in first-seen order;
/// absent and missing cells are skipped, and a column with a single distinct
/// value keeps its typed cell.
pub fn collapse(
    sheet: &Sheet,
    keys: &[usize],
    separator: &str,
    cancel: &CancelToken,
) -> EngineResult<Sheet> {
    let grouping = group_rows(sheet, keys, &GroupOptions::default(), cancel)?;
    let mut result = sheet.header_only();

    for (_, members) in grouping.iter() {
        cancel.check()?;
        let mut row = Row::new();
        for col in 0..sheet.column_count() {
            if keys.contains(&col) {
                if let Some(cell) = members.first().and_then(|&r| sheet.cell(r, col)) {
                    row.set(col, cell.clone());
                }
                continue;
            }
            let mut distinct: Vec<&CellValue> = Vec::new();
            for cell in members.iter().filter_map(|&r| sheet.cell(r, col)) {
                if !cell.is_missing() && !distinct.iter().any(|d| d.to_string() == cell.to_string()) {
                    distinct.push(cell);
                }
            }
            match distinct.as_slice() {
                [] => {}
                [single] => row.set(col, (*single).clone()),
                many => row.set(
                    col,
                    CellValue::String(
                        many.iter()
                            .map(|c| c.to_string())
                            .collect::<Vec<_>>()
                            .join(separator),
                    ),
                ),
            }
        }
        result.add_row(row)?;
    }
    Ok(result)
}

/// Histogram of the numeric cells of one column
///
/// Returns a sheet with the columns `bin`, `min`, `max` and `count`; `bin`
/// starts at 1.
pub fn histogram(sheet: &Sheet, column: usize, algorithm: &dyn BinningAlgorithm) -> EngineResult<Sheet> {
    column_name(sheet, column)?;
    let values: Vec<f64> = (0..sheet.row_count())
        .filter_map(|r| sheet.cell(r, column))
        .filter_map(CellValue::numeric_value)
        .collect();
    let bins = algorithm.generate_bins(&values)?;
    debug!("{} value(s) in {} bin(s)", values.len(), bins.len());

    let mut result = sheet.derive(
        ["bin", "min", "max", "count"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )?;
    for bin in bins {
        result.push_values(vec![
            CellValue::Long(bin.index as i64 + 1),
            CellValue::Double(bin.min),
            CellValue::Double(bin.max),
            CellValue::Long(bin.count as i64),
        ])?;
    }
    Ok(result)
}

fn column_name(sheet: &Sheet, col: usize) -> EngineResult<String> {
    sheet
        .header()
        .name(col)
        .map(str::to_string)
        .ok_or_else(|| EngineError::unknown_column(format!("#{}", col + 1)))
}

fn key_names(sheet: &Sheet, keys: &[usize]) -> EngineResult<Vec<String>> {
    keys.iter().map(|&col| column_name(sheet, col)).collect()
}

fn key_cells(sheet: &Sheet, keys: &[usize], members: &[usize]) -> Row {
    let mut row = Row::new();
    if let Some(&first) = members.first() {
        for (target, &col) in keys.iter().enumerate() {
            if let Some(cell) = sheet.cell(first, col) {
                row.set(target, cell.clone());
            }
        }
    }
    row
}
