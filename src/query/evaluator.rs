//! Query evaluation
//!
//! Evaluation runs in two phases. Binding resolves every column reference of
//! every statement against the header each statement will see, so an unknown
//! column is reported before any row is read or written. Execution then runs the
//! statements in order, each one consuming the previous statement's output.
//!
//! Statements are executed against a [`Cow`] sheet: `SELECT` always builds a new
//! sheet, while `UPDATE` and `DELETE` mutate in place, cloning the input first
//! only when evaluating a borrowed sheet.

use std::borrow::Cow;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::ast::{
    AggregateTarget, ColumnRef, CompareOp, Condition, Limit, Pattern, Sampling, SelectItem,
    Statement, ValueExpr,
};
use super::Query;
use crate::aggregate::AggregateFunction;
use crate::cancel::CancelToken;
use crate::cell::{CellValue, ContentType};
use crate::error::{EngineError, EngineResult, TypeCoercionWarning};
use crate::grouping::{group_rows, GroupOptions};
use crate::sheet::{Header, Row, Sheet, SortDirection};

/// Options for a single evaluation
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Polled between groups and every [`crate::cancel::ROW_POLL_INTERVAL`] rows
    pub cancel: CancelToken,
    /// Seed for `SELECT <n>` sampling
    pub seed: u64,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            cancel: CancelToken::new(),
            seed: 1,
        }
    }
}

/// Evaluate a query against a copy of `sheet`
///
/// # Returns
/// * `Ok(Sheet)` the output of the last statement
/// * `Err(Bind)` if any statement references an unknown column; nothing is evaluated
/// * `Err(Cancelled)` if cancellation was observed
pub fn evaluate_copy(sheet: &Sheet, query: &Query, options: &EvalOptions) -> EngineResult<Sheet> {
    let plan = bind(query, sheet.header())?;
    let mut current = Cow::Borrowed(sheet);
    for statement in &plan {
        current = execute(current, statement, options)?;
    }
    Ok(current.into_owned())
}

/// Evaluate a query, replacing `sheet` with the result
///
/// A failed bind leaves `sheet` untouched. Cancellation does not roll back: a
/// cancelled `UPDATE` may leave some rows already updated.
pub fn evaluate_in_place(sheet: &mut Sheet, query: &Query, options: &EvalOptions) -> EngineResult<()> {
    let plan = bind(query, sheet.header())?;
    for statement in &plan {
        match statement {
            BoundStatement::Update(update) => execute_update(sheet, update, options)?,
            BoundStatement::Delete(condition) => execute_delete(sheet, condition.as_ref(), options)?,
            other => {
                let result = execute(Cow::Borrowed(&*sheet), other, options)?.into_owned();
                *sheet = result;
            }
        }
    }
    Ok(())
}

fn execute<'a>(
    sheet: Cow<'a, Sheet>,
    statement: &BoundStatement,
    options: &EvalOptions,
) -> EngineResult<Cow<'a, Sheet>> {
    match statement {
        BoundStatement::Select(select) => Ok(Cow::Owned(execute_select(&sheet, select, options)?)),
        BoundStatement::Aggregate(aggregate) => {
            Ok(Cow::Owned(execute_aggregate(&sheet, aggregate, options)?))
        }
        BoundStatement::Update(update) => {
            let mut owned = sheet.into_owned();
            execute_update(&mut owned, update, options)?;
            Ok(Cow::Owned(owned))
        }
        BoundStatement::Delete(condition) => {
            let mut owned = sheet.into_owned();
            execute_delete(&mut owned, condition.as_ref(), options)?;
            Ok(Cow::Owned(owned))
        }
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// A value with its column reference resolved
#[derive(Debug, Clone)]
enum BoundValue {
    Literal(CellValue),
    Column(usize),
}

#[derive(Debug, Clone)]
enum BoundCondition {
    Compare {
        column: usize,
        op: CompareOp,
        value: BoundValue,
    },
    Regexp {
        column: usize,
        pattern: Pattern,
    },
    IsNull(usize),
    CellType {
        column: usize,
        kind: String,
    },
    And(Box<BoundCondition>, Box<BoundCondition>),
    Or(Box<BoundCondition>, Box<BoundCondition>),
    Not(Box<BoundCondition>),
}

#[derive(Debug)]
struct BoundSelect {
    projection: Vec<(usize, Option<String>)>,
    sample: Option<Sampling>,
    condition: Option<BoundCondition>,
    order_by: Vec<(usize, SortDirection)>,
    limit: Option<Limit>,
}

#[derive(Debug)]
struct BoundAggregate {
    condition: Option<BoundCondition>,
    group_by: Vec<usize>,
    /// Reducer and target column; `None` counts rows
    columns: Vec<(AggregateFunction, Option<usize>)>,
    output: Vec<String>,
    having: Option<BoundCondition>,
}

#[derive(Debug)]
struct BoundUpdate {
    assignments: Vec<(usize, BoundValue)>,
    condition: Option<BoundCondition>,
}

#[derive(Debug)]
enum BoundStatement {
    Select(BoundSelect),
    Aggregate(BoundAggregate),
    Update(BoundUpdate),
    Delete(Option<BoundCondition>),
}

/// Bind every statement against the header it will see
fn bind(query: &Query, header: &Header) -> EngineResult<Vec<BoundStatement>> {
    debug!("Binding {} statement(s)", query.statements().len());
    let mut current = header.clone();
    let mut plan = Vec::with_capacity(query.statements().len());
    for statement in query.statements() {
        debug!("Binding {} against {} column(s)", statement.kind(), current.len());
        let (bound, next) = bind_statement(statement, &current)?;
        plan.push(bound);
        current = next;
    }
    Ok(plan)
}

fn bind_statement(statement: &Statement, header: &Header) -> EngineResult<(BoundStatement, Header)> {
    match statement {
        Statement::Select(select) => {
            let mut projection = Vec::new();
            for item in &select.items {
                match item {
                    SelectItem::All => projection.extend((0..header.len()).map(|col| (col, None))),
                    SelectItem::Column { column, alias } => {
                        projection.push((resolve_column(column, header)?, alias.clone()))
                    }
                }
            }
            let output = Header::new(
                projection
                    .iter()
                    .map(|(col, alias)| {
                        alias
                            .clone()
                            .unwrap_or_else(|| header.name(*col).unwrap_or_default().to_string())
                    })
                    .collect(),
            )?;

            let order_by = select
                .order_by
                .iter()
                .map(|item| {
                    resolve_order_column(&item.column, header, &projection, &output)
                        .map(|col| (col, item.direction))
                })
                .collect::<EngineResult<Vec<_>>>()?;

            let bound = BoundSelect {
                projection,
                sample: select.sample,
                condition: bind_optional(select.where_clause.as_ref(), header)?,
                order_by,
                limit: select.limit,
            };
            Ok((BoundStatement::Select(bound), output))
        }
        Statement::SelectAggregate(aggregate) => {
            let group_by = aggregate
                .group_by
                .iter()
                .map(|column| resolve_column(column, header))
                .collect::<EngineResult<Vec<_>>>()?;

            let mut output: Vec<String> = group_by
                .iter()
                .map(|&col| header.name(col).unwrap_or_default().to_string())
                .collect();
            let mut columns = Vec::with_capacity(aggregate.aggregates.len());
            for item in &aggregate.aggregates {
                let (target, target_name) = match &item.target {
                    AggregateTarget::AllRows if item.function == AggregateFunction::Count => {
                        (None, "*".to_string())
                    }
                    AggregateTarget::AllRows => {
                        return Err(EngineError::Bind(format!(
                            "{}(*) is not supported, only COUNT accepts '*'",
                            item.function.name()
                        )))
                    }
                    AggregateTarget::Column(column) => {
                        let col = resolve_column(column, header)?;
                        (Some(col), header.name(col).unwrap_or_default().to_string())
                    }
                };
                output.push(
                    item.alias
                        .clone()
                        .unwrap_or_else(|| format!("{}({})", item.function.name(), target_name)),
                );
                columns.push((item.function, target));
            }
            let output = Header::new(output)?;

            let bound = BoundAggregate {
                condition: bind_optional(aggregate.where_clause.as_ref(), header)?,
                group_by,
                columns,
                having: bind_optional(aggregate.having.as_ref(), &output)?,
                output: output.names().to_vec(),
            };
            Ok((BoundStatement::Aggregate(bound), output))
        }
        Statement::Update(update) => {
            let assignments = update
                .assignments
                .iter()
                .map(|a| Ok((resolve_column(&a.column, header)?, bind_value(&a.value, header)?)))
                .collect::<EngineResult<Vec<_>>>()?;
            let bound = BoundUpdate {
                assignments,
                condition: bind_optional(update.where_clause.as_ref(), header)?,
            };
            Ok((BoundStatement::Update(bound), header.clone()))
        }
        Statement::Delete(delete) => Ok((
            BoundStatement::Delete(bind_optional(delete.where_clause.as_ref(), header)?),
            header.clone(),
        )),
    }
}

fn resolve_column(column: &ColumnRef, header: &Header) -> EngineResult<usize> {
    match column {
        ColumnRef::Name(name) => header
            .index_of(name)
            .ok_or_else(|| EngineError::unknown_column(name)),
        ColumnRef::Index(idx) if *idx < header.len() => Ok(*idx),
        ColumnRef::Index(idx) => Err(EngineError::Bind(format!(
            "Column #{} is out of range, the sheet has {} columns",
            idx + 1,
            header.len()
        ))),
    }
}

/// ORDER BY columns must be projected; they match an output name or the source
/// name of a projected column
fn resolve_order_column(
    column: &ColumnRef,
    input: &Header,
    projection: &[(usize, Option<String>)],
    output: &Header,
) -> EngineResult<usize> {
    let found = match column {
        ColumnRef::Name(name) => output.index_of(name).or_else(|| {
            let source = input.index_of(name)?;
            projection.iter().position(|(col, _)| *col == source)
        }),
        ColumnRef::Index(idx) => Some(*idx).filter(|idx| *idx < output.len()),
    };
    found.ok_or_else(|| {
        EngineError::Bind(format!(
            "ORDER BY column '{}' is not in the select list",
            column
        ))
    })
}

fn bind_value(value: &ValueExpr, header: &Header) -> EngineResult<BoundValue> {
    Ok(match value {
        ValueExpr::Number(cell) => BoundValue::Literal(cell.clone()),
        ValueExpr::String(s) => BoundValue::Literal(CellValue::String(s.clone())),
        ValueExpr::Boolean(b) => BoundValue::Literal(CellValue::Boolean(*b)),
        ValueExpr::Parse { value, .. } => BoundValue::Literal(value.clone()),
        ValueExpr::Column(column) => BoundValue::Column(resolve_column(column, header)?),
    })
}

fn bind_optional(condition: Option<&Condition>, header: &Header) -> EngineResult<Option<BoundCondition>> {
    condition.map(|c| bind_condition(c, header)).transpose()
}

fn bind_condition(condition: &Condition, header: &Header) -> EngineResult<BoundCondition> {
    Ok(match condition {
        Condition::Compare { column, op, value } => BoundCondition::Compare {
            column: resolve_column(column, header)?,
            op: *op,
            value: bind_value(value, header)?,
        },
        Condition::Regexp { column, pattern } => BoundCondition::Regexp {
            column: resolve_column(column, header)?,
            pattern: pattern.clone(),
        },
        Condition::IsNull(column) => BoundCondition::IsNull(resolve_column(column, header)?),
        Condition::CellType { column, kind } => BoundCondition::CellType {
            column: resolve_column(column, header)?,
            kind: kind.clone(),
        },
        Condition::And(left, right) => BoundCondition::And(
            Box::new(bind_condition(left, header)?),
            Box::new(bind_condition(right, header)?),
        ),
        Condition::Or(left, right) => BoundCondition::Or(
            Box::new(bind_condition(left, header)?),
            Box::new(bind_condition(right, header)?),
        ),
        Condition::Not(inner) => BoundCondition::Not(Box::new(bind_condition(inner, header)?)),
    })
}

// ---------------------------------------------------------------------------
// Condition evaluation
// ---------------------------------------------------------------------------

/// Collects string-comparison fallbacks so they are logged once per statement
#[derive(Default)]
struct Fallbacks {
    first: Option<TypeCoercionWarning>,
    count: usize,
}

impl Fallbacks {
    fn record(&mut self, left: &CellValue, right: &CellValue) {
        self.count += 1;
        if self.first.is_none() {
            self.first = Some(TypeCoercionWarning {
                left: left.to_string(),
                right: right.to_string(),
            });
        }
    }

    fn log(&self) {
        if let Some(first) = &self.first {
            debug!("{} ({} comparison(s) in total)", first, self.count);
        }
    }
}

impl BoundCondition {
    /// Evaluate the condition against one row
    ///
    /// AND and OR short-circuit. Any comparison involving an absent or missing
    /// cell is false.
    fn matches(&self, row: &Row, fallbacks: &mut Fallbacks) -> bool {
        match self {
            BoundCondition::Compare { column, op, value } => {
                let Some(left) = row.cell(*column).filter(|c| !c.is_missing()) else {
                    return false;
                };
                let right = match value {
                    BoundValue::Literal(cell) => cell,
                    BoundValue::Column(col) => match row.cell(*col) {
                        Some(cell) => cell,
                        None => return false,
                    },
                };
                match left.compare(right) {
                    Some(result) => {
                        if result.string_fallback {
                            fallbacks.record(left, right);
                        }
                        op.holds(result.ordering)
                    }
                    None => false,
                }
            }
            BoundCondition::Regexp { column, pattern } => match row.cell(*column) {
                Some(cell) if !cell.is_missing() => pattern.is_match(&cell.to_string()),
                _ => false,
            },
            BoundCondition::IsNull(column) => row.is_null(*column),
            BoundCondition::CellType { column, kind } => row
                .cell(*column)
                .map_or(ContentType::Missing, CellValue::content_type)
                .matches_name(kind),
            BoundCondition::And(left, right) => {
                left.matches(row, fallbacks) && right.matches(row, fallbacks)
            }
            BoundCondition::Or(left, right) => {
                left.matches(row, fallbacks) || right.matches(row, fallbacks)
            }
            BoundCondition::Not(inner) => !inner.matches(row, fallbacks),
        }
    }
}

/// One flag per row: true if the row satisfies `condition` (or there is none)
fn match_rows(
    sheet: &Sheet,
    condition: Option<&BoundCondition>,
    cancel: &CancelToken,
) -> EngineResult<Vec<bool>> {
    let Some(condition) = condition else {
        cancel.check()?;
        return Ok(vec![true; sheet.row_count()]);
    };
    let mut fallbacks = Fallbacks::default();
    let mut mask = Vec::with_capacity(sheet.row_count());
    for (idx, row) in sheet.rows().iter().enumerate() {
        cancel.check_row(idx)?;
        mask.push(condition.matches(row, &mut fallbacks));
    }
    fallbacks.log();
    Ok(mask)
}

fn matching_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(idx, &hit)| hit.then_some(idx))
        .collect()
}

// ---------------------------------------------------------------------------
// Statement execution
// ---------------------------------------------------------------------------

fn execute_select(sheet: &Sheet, select: &BoundSelect, options: &EvalOptions) -> EngineResult<Sheet> {
    let mask = match_rows(sheet, select.condition.as_ref(), &options.cancel)?;
    let mut rows = matching_indices(&mask);
    debug!("SELECT: {} of {} row(s) match", rows.len(), sheet.row_count());

    if let Some(sampling) = select.sample {
        rows = sample_rows(rows, sampling, options.seed);
        debug!("SELECT: sampled {} row(s)", rows.len());
    }

    let mut result = sheet.take_rows(&rows).project(&select.projection)?;

    if !select.order_by.is_empty() {
        result.sort_by_columns(&select.order_by)?;
    }

    if let Some(limit) = select.limit {
        let start = limit.offset.min(result.row_count());
        let end = start.saturating_add(limit.max).min(result.row_count());
        let kept = result.rows()[start..end].to_vec();
        result.replace_rows(kept);
    }

    Ok(result)
}

/// Keep a seeded random subset of `rows`, in their original order
fn sample_rows(rows: Vec<usize>, sampling: Sampling, seed: u64) -> Vec<usize> {
    let amount = match sampling {
        Sampling::Count(n) => n,
        Sampling::Fraction(f) => (rows.len() as f64 * f).round() as usize,
    };
    if amount >= rows.len() {
        return rows;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, rows.len(), amount).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| rows[i]).collect()
}

fn execute_aggregate(
    sheet: &Sheet,
    aggregate: &BoundAggregate,
    options: &EvalOptions,
) -> EngineResult<Sheet> {
    let cancel = &options.cancel;
    let mask = match_rows(sheet, aggregate.condition.as_ref(), cancel)?;
    let rows = matching_indices(&mask);

    let groups: Vec<Vec<usize>> = if aggregate.group_by.is_empty() {
        vec![rows]
    } else {
        let subset = sheet.take_rows(&rows);
        group_rows(&subset, &aggregate.group_by, &GroupOptions::default(), cancel)?
            .into_iter()
            .map(|(_, members)| members.into_iter().map(|m| rows[m]).collect())
            .collect()
    };
    debug!("Aggregating {} group(s)", groups.len());

    let mut result = sheet.derive(aggregate.output.clone())?;
    let keys = aggregate.group_by.len();
    for members in &groups {
        cancel.check()?;
        let mut out = Row::new();
        if let Some(&first) = members.first() {
            for (target, &col) in aggregate.group_by.iter().enumerate() {
                if let Some(cell) = sheet.cell(first, col) {
                    out.set(target, cell.clone());
                }
            }
        }
        for (offset, (function, target)) in aggregate.columns.iter().enumerate() {
            let cell = match target {
                None => CellValue::Long(members.len() as i64),
                Some(col) => {
                    let values: Vec<f64> = members
                        .iter()
                        .filter_map(|&r| sheet.cell(r, *col))
                        .filter_map(CellValue::numeric_value)
                        .collect();
                    function.compute_cell(&values)
                }
            };
            out.set(keys + offset, cell);
        }
        trace!("Group of {} row(s) aggregated", members.len());
        result.add_row(out)?;
    }

    if let Some(having) = &aggregate.having {
        let keep = match_rows(&result, Some(having), cancel)?;
        result.retain_by_mask(&keep);
        debug!("HAVING kept {} of {} group(s)", result.row_count(), groups.len());
    }

    Ok(result)
}

fn execute_update(sheet: &mut Sheet, update: &BoundUpdate, options: &EvalOptions) -> EngineResult<()> {
    let mask = match_rows(sheet, update.condition.as_ref(), &options.cancel)?;
    let targets = matching_indices(&mask);
    debug!("UPDATE: {} row(s) match", targets.len());

    for (n, &idx) in targets.iter().enumerate() {
        options.cancel.check_row(n)?;
        let Some(row) = sheet.row_mut(idx) else {
            continue;
        };
        // every value is read before any is written, so `SET a = b, b = a` swaps
        let values: Vec<(usize, Option<CellValue>)> = update
            .assignments
            .iter()
            .map(|(col, value)| {
                let cell = match value {
                    BoundValue::Literal(cell) => Some(cell.clone()),
                    BoundValue::Column(source) => row.cell(*source).cloned(),
                };
                (*col, cell)
            })
            .collect();
        for (col, cell) in values {
            match cell {
                Some(cell) => row.set(col, cell),
                None => {
                    row.remove(col);
                }
            }
        }
    }
    Ok(())
}

fn execute_delete(
    sheet: &mut Sheet,
    condition: Option<&BoundCondition>,
    options: &EvalOptions,
) -> EngineResult<()> {
    let mask = match_rows(sheet, condition, &options.cancel)?;
    let keep: Vec<bool> = mask.iter().map(|hit| !hit).collect();
    let before = sheet.row_count();
    sheet.retain_by_mask(&keep);
    debug!("DELETE: removed {} of {} row(s)", before - sheet.row_count(), before);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff() -> Sheet {
        let mut sheet = Sheet::new(vec!["Dept".to_string(), "Salary".to_string()]).unwrap();
        for (dept, salary) in [("A", 10), ("B", 20), ("A", 30)] {
            sheet
                .push_values(vec![CellValue::from(dept), CellValue::Long(salary)])
                .unwrap();
        }
        sheet
    }

    fn run(sheet: &Sheet, text: &str) -> EngineResult<Sheet> {
        evaluate_copy(sheet, &Query::parse(text)?, &EvalOptions::default())
    }

    fn column(sheet: &Sheet, col: usize) -> Vec<String> {
        (0..sheet.row_count())
            .map(|r| sheet.content_string(r, col))
            .collect()
    }

    #[test]
    fn test_select_star_is_identity() {
        let sheet = staff();
        assert_eq!(run(&sheet, "SELECT *").unwrap(), sheet);
    }

    #[test]
    fn test_filter_order_limit() {
        let sheet = staff();
        let result = run(&sheet, "SELECT Dept, Salary WHERE Salary > 15 ORDER BY Salary DESC").unwrap();
        assert_eq!(column(&result, 0), vec!["A", "B"]);
        assert_eq!(column(&result, 1), vec!["30", "20"]);

        let limited = run(&sheet, "SELECT * LIMIT 1, 10").unwrap();
        assert_eq!(column(&limited, 1), vec!["20", "30"]);
    }

    #[test]
    fn test_order_by_alias_and_source_name() {
        let sheet = staff();
        let by_alias = run(&sheet, "SELECT Salary AS Pay ORDER BY Pay DESC").unwrap();
        assert_eq!(by_alias.columns(), &["Pay".to_string()]);
        assert_eq!(column(&by_alias, 0), vec!["30", "20", "10"]);
        let by_source = run(&sheet, "SELECT Salary AS Pay ORDER BY Salary").unwrap();
        assert_eq!(column(&by_source, 0), vec!["10", "20", "30"]);
        assert!(matches!(
            run(&sheet, "SELECT Dept ORDER BY Salary"),
            Err(EngineError::Bind(_))
        ));
    }

    #[test]
    fn test_group_sum() {
        let sheet = staff();
        let result = run(&sheet, "SELECT SUM(Salary) GROUP BY Dept").unwrap();
        assert_eq!(result.columns(), &["Dept".to_string(), "SUM(Salary)".to_string()]);
        assert_eq!(column(&result, 0), vec!["A", "B"]);
        assert_eq!(result.cell(0, 1), Some(&CellValue::Double(40.0)));
        assert_eq!(result.cell(1, 1), Some(&CellValue::Double(20.0)));
    }

    #[test]
    fn test_having_filters_output_rows() {
        let sheet = staff();
        let result = run(&sheet, "SELECT COUNT(*) AS n, MAX(Salary) GROUP BY Dept HAVING n > 1").unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.cell(0, 1), Some(&CellValue::Long(2)));
        assert_eq!(result.cell(0, 2), Some(&CellValue::Double(30.0)));
    }

    #[test]
    fn test_aggregate_without_rows() {
        let sheet = staff();
        let result = run(&sheet, "SELECT COUNT(*), SUM(Salary) WHERE Salary > 100").unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.cell(0, 0), Some(&CellValue::Long(0)));
        assert_eq!(result.cell(0, 1), Some(&CellValue::Missing));
    }

    #[test]
    fn test_sum_over_non_numeric_is_missing() {
        let sheet = staff();
        let result = run(&sheet, "SELECT SUM(Dept), COUNT(Dept)").unwrap();
        assert_eq!(result.cell(0, 0), Some(&CellValue::Missing));
        assert_eq!(result.cell(0, 1), Some(&CellValue::Long(0)));
    }

    #[test]
    fn test_update_and_delete() {
        let sheet = staff();
        let updated = run(&sheet, "UPDATE SET Salary = 0 WHERE Dept = \"A\"").unwrap();
        assert_eq!(column(&updated, 1), vec!["0", "20", "0"]);
        assert_eq!(updated.columns(), sheet.columns());

        let deleted = run(&sheet, "DELETE WHERE Dept = \"A\"").unwrap();
        assert_eq!(column(&deleted, 0), vec!["B"]);
        assert_eq!(run(&sheet, "DELETE").unwrap().row_count(), 0);
    }

    #[test]
    fn test_update_swaps_columns() {
        let mut sheet = Sheet::new(vec!["a".to_string(), "b".to_string()]).unwrap();
        sheet
            .push_values(vec![CellValue::Long(1), CellValue::Long(2)])
            .unwrap();
        let swapped = run(&sheet, "UPDATE SET a = b, b = a").unwrap();
        assert_eq!(swapped.cell(0, 0), Some(&CellValue::Long(2)));
        assert_eq!(swapped.cell(0, 1), Some(&CellValue::Long(1)));
    }

    #[test]
    fn test_unknown_column_aborts_without_output() {
        let mut sheet = staff();
        let query = Query::parse("UPDATE SET Salary = 0 SELECT Nope").unwrap();
        let result = evaluate_in_place(&mut sheet, &query, &EvalOptions::default());
        assert!(matches!(result, Err(EngineError::Bind(_))));
        assert_eq!(sheet, staff());
    }

    #[test]
    fn test_statements_chain_headers() {
        let sheet = staff();
        let result = run(&sheet, "SELECT Salary AS Pay; UPDATE SET Pay = 1 WHERE Pay >= 20").unwrap();
        assert_eq!(column(&result, 0), vec!["10", "1", "1"]);
        assert!(run(&sheet, "SELECT Salary AS Pay; DELETE WHERE Dept = \"A\"").is_err());
    }

    #[test]
    fn test_missing_cells_never_compare() {
        let mut sheet = staff();
        sheet.set_cell(0, 1, CellValue::Missing).unwrap();
        let lt = run(&sheet, "SELECT * WHERE Salary < 100").unwrap();
        let ge = run(&sheet, "SELECT * WHERE Salary >= 100").unwrap();
        assert_eq!(lt.row_count() + ge.row_count(), 2);
        assert_eq!(run(&sheet, "SELECT * WHERE Salary IS NULL").unwrap().row_count(), 1);
        assert_eq!(
            run(&sheet, "SELECT * WHERE CELLTYPE(Salary) = \"missing\"").unwrap().row_count(),
            1
        );
    }

    #[test]
    fn test_regexp_full_match() {
        let sheet = staff();
        assert_eq!(run(&sheet, "SELECT * WHERE Salary REGEXP \"[13]0\"").unwrap().row_count(), 2);
        assert_eq!(run(&sheet, "SELECT * WHERE Salary REGEXP \"0\"").unwrap().row_count(), 0);
    }

    #[test]
    fn test_sampling_is_seeded_and_ordered() {
        let mut sheet = Sheet::new(vec!["n".to_string()]).unwrap();
        for i in 0..100 {
            sheet.push_values(vec![CellValue::Long(i)]).unwrap();
        }
        let first = run(&sheet, "SELECT 10").unwrap();
        let second = run(&sheet, "SELECT 10").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.row_count(), 10);
        let values: Vec<i64> = first
            .rows()
            .iter()
            .filter_map(|r| match r.cell(0) {
                Some(CellValue::Long(i)) => Some(*i),
                _ => None,
            })
            .collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(run(&sheet, "SELECT 0.25").unwrap().row_count(), 25);
        assert_eq!(run(&sheet, "SELECT 500").unwrap().row_count(), 100);
    }

    #[test]
    fn test_star_target_only_for_count() {
        let sheet = staff();
        assert!(matches!(run(&sheet, "SELECT SUM(*)"), Err(EngineError::Bind(_))));
    }

    #[test]
    fn test_cancelled_evaluation() {
        let sheet = staff();
        let options = EvalOptions::default();
        options.cancel.cancel();
        let query = Query::parse("SELECT * WHERE Salary > 1").unwrap();
        assert!(matches!(
            evaluate_copy(&sheet, &query, &options),
            Err(EngineError::Cancelled)
        ));
    }
}
