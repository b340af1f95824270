//! Tests for aggregate queries and per-group aggregation

use crate::helpers::{column, people, run, sheet, staff};
use sheetql::ops::aggregate_by_group;
use sheetql::{AggregateFunction, CancelToken, CellValue, EngineError};

fn double(cell: Option<&CellValue>) -> f64 {
    match cell {
        Some(CellValue::Double(d)) => *d,
        other => panic!("expected a double, got {:?}", other),
    }
}

#[test]
fn test_sum_per_department() {
    let result = run(&staff(), "SELECT SUM(Salary) GROUP BY Dept").unwrap();
    assert_eq!(result.row_count(), 2);
    let mut pairs: Vec<(String, f64)> = (0..result.row_count())
        .map(|r| (result.content_string(r, 0), double(result.cell(r, 1))))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(pairs, vec![("A".to_string(), 40.0), ("B".to_string(), 20.0)]);
}

#[test]
fn test_count_star_and_count_column() {
    let result = run(
        &people(),
        "SELECT COUNT(*) AS Rows, COUNT(Salary) AS Paid GROUP BY Dept",
    )
    .unwrap();
    assert_eq!(column(&result, 0), vec!["A", "B", "C"]);
    assert_eq!(column(&result, 1), vec!["2", "2", "1"]);
    assert_eq!(column(&result, 2), vec!["2", "1", "1"]);
}

#[test]
fn test_statistics() {
    let values = sheet(
        &["v"],
        &[&["2"], &["4"], &["4"], &["4"], &["5"], &["5"], &["7"], &["9"]],
    );
    let result = run(
        &values,
        "SELECT MEDIAN(v), STDEVP(v), IQR(v), AVERAGE(v), STDEV(v), RANGE(v)",
    )
    .unwrap();
    assert_eq!(
        result.columns(),
        &[
            "MEDIAN(v)".to_string(),
            "STDEVP(v)".to_string(),
            "IQR(v)".to_string(),
            "MEAN(v)".to_string(),
            "STDEV(v)".to_string(),
            "RANGE(v)".to_string(),
        ]
    );
    assert_eq!(double(result.cell(0, 0)), 4.5);
    assert!((double(result.cell(0, 1)) - 2.0).abs() < 1e-12);
    assert_eq!(double(result.cell(0, 2)), 2.0);
    assert_eq!(double(result.cell(0, 3)), 5.0);
    assert!((double(result.cell(0, 4)) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    assert_eq!(double(result.cell(0, 5)), 7.0);
}

#[test]
fn test_empty_numeric_subset_is_missing() {
    let result = run(&people(), "SELECT SUM(Name), COUNT(Name), MIN(Name) GROUP BY Dept").unwrap();
    for row in 0..result.row_count() {
        assert_eq!(result.cell(row, 1), Some(&CellValue::Missing));
        assert_eq!(result.cell(row, 2), Some(&CellValue::Long(0)));
        assert_eq!(result.cell(row, 3), Some(&CellValue::Missing));
    }
}

#[test]
fn test_where_applies_before_grouping() {
    let result = run(
        &people(),
        "SELECT MAX(Salary) AS Top WHERE [Start Date] > PARSE(\"date\", \"2019-12-31\") GROUP BY Dept",
    )
    .unwrap();
    assert_eq!(column(&result, 0), vec!["B", "A"]);
    assert_eq!(double(result.cell(0, 1)), 3900.0);
    assert_eq!(double(result.cell(1, 1)), 4200.5);
}

#[test]
fn test_having_uses_output_columns() {
    let result = run(&people(), "SELECT MEAN(Salary) AS Avg GROUP BY Dept HAVING Avg >= 4000").unwrap();
    assert_eq!(column(&result, 0), vec!["A", "C"]);

    assert!(matches!(
        run(&people(), "SELECT MEAN(Salary) GROUP BY Dept HAVING Salary > 1"),
        Err(EngineError::Bind(_))
    ));
}

#[test]
fn test_star_target_needs_count() {
    assert!(matches!(run(&staff(), "SELECT SUM(*)"), Err(EngineError::Bind(_))));
}

#[test]
fn test_aggregate_by_group_operation() {
    let sheet = people();
    let result = aggregate_by_group(
        &sheet,
        &[1],
        &[3],
        &[AggregateFunction::Sum, AggregateFunction::Count],
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(
        result.columns(),
        &[
            "Dept".to_string(),
            "Salary-SUM".to_string(),
            "Salary-COUNT".to_string()
        ]
    );
    assert_eq!(double(result.cell(0, 1)), 9200.5);
    assert_eq!(result.cell(1, 2), Some(&CellValue::Long(1)));

    assert!(matches!(
        aggregate_by_group(&sheet, &[1], &[3], &[], &CancelToken::new()),
        Err(EngineError::InvalidInput(_))
    ));
}
