//! Tests for UPDATE, DELETE and statement lists

use crate::helpers::{column, people, run, staff};
use sheetql::{evaluate_in_place, CellValue, EngineError, EvalOptions, Query};

#[test]
fn test_update_matching_rows() {
    let sheet = staff();
    let result = run(&sheet, "UPDATE SET Salary = 0 WHERE Dept = \"A\"").unwrap();
    assert_eq!(result.columns(), sheet.columns());
    assert_eq!(result.row_count(), 3);
    assert_eq!(column(&result, 0), vec!["A", "B", "A"]);
    assert_eq!(column(&result, 1), vec!["0", "20", "0"]);
}

#[test]
fn test_update_creates_absent_cells() {
    let mut sheet = staff();
    sheet.row_mut(1).unwrap().remove(1);
    let result = run(&sheet, "UPDATE SET Salary = 1.5 WHERE Salary IS NULL").unwrap();
    assert_eq!(result.cell(1, 1), Some(&CellValue::Double(1.5)));
    assert_eq!(result.cell(0, 1), Some(&CellValue::Long(10)));
}

#[test]
fn test_update_with_typed_values() {
    let result = run(
        &people(),
        "UPDATE SET [Start Date] = PARSE(\"date\", \"2024-05-01\"), Name = \"new\" WHERE Salary IS NULL",
    )
    .unwrap();
    assert_eq!(result.content_string(1, 0), "new");
    assert_eq!(result.content_string(1, 2), "2024-05-01");
    assert!(result.cell(1, 2).unwrap().is_temporal());
    assert_eq!(result.content_string(0, 0), "ann");
}

#[test]
fn test_delete() {
    let sheet = staff();
    let result = run(&sheet, "DELETE WHERE Salary < 25").unwrap();
    assert_eq!(column(&result, 1), vec!["30"]);

    let emptied = run(&sheet, "DELETE").unwrap();
    assert_eq!(emptied.row_count(), 0);
    assert_eq!(emptied.columns(), sheet.columns());
}

#[test]
fn test_statement_list_runs_in_order() {
    let result = run(
        &people(),
        "UPDATE SET Salary = 0 WHERE Salary IS NULL; DELETE WHERE Dept = \"C\" SELECT Name, Salary ORDER BY Salary",
    )
    .unwrap();
    assert_eq!(column(&result, 0), vec!["bob", "eve", "cid", "ann"]);
}

#[test]
fn test_in_place_matches_copy() {
    let text = "UPDATE SET Salary = 1 WHERE Dept = \"B\"; DELETE WHERE Name = \"dee\"; SELECT Name, Salary";
    let sheet = people();
    let copy = run(&sheet, text).unwrap();

    let mut target = sheet.clone();
    evaluate_in_place(&mut target, &Query::parse(text).unwrap(), &EvalOptions::default()).unwrap();
    assert_eq!(target, copy);
}

#[test]
fn test_bind_failure_leaves_sheet_untouched() {
    let mut sheet = people();
    let before = sheet.clone();
    let query = Query::parse("DELETE WHERE Dept = \"A\"; UPDATE SET Bonus = 1").unwrap();
    let err = evaluate_in_place(&mut sheet, &query, &EvalOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::Bind(_)));
    assert_eq!(sheet, before);
}

#[test]
fn test_later_statement_sees_projected_header() {
    let err = run(&staff(), "SELECT Dept; DELETE WHERE Salary > 1").unwrap_err();
    assert!(matches!(err, EngineError::Bind(_)));
}
