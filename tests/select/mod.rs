//! Tests for plain SELECT statements

use crate::helpers::{column, people, run, sheet, staff};
use sheetql::{evaluate, Bindings, CellValue, EngineError};

#[test]
fn test_filter_then_order_desc() {
    let result = run(&staff(), "SELECT Dept, Salary WHERE Salary > 15 ORDER BY Salary DESC").unwrap();
    assert_eq!(result.columns(), &["Dept".to_string(), "Salary".to_string()]);
    assert_eq!(column(&result, 0), vec!["A", "B"]);
    assert_eq!(column(&result, 1), vec!["30", "20"]);
}

#[test]
fn test_limit_clips_at_row_count() {
    let sheet = staff();
    assert_eq!(run(&sheet, "SELECT * LIMIT 2").unwrap().row_count(), 2);
    assert_eq!(run(&sheet, "SELECT * LIMIT 50").unwrap().row_count(), 3);
    assert_eq!(run(&sheet, "SELECT * LIMIT 5, 1").unwrap().row_count(), 0);
    let tail = run(&sheet, "SELECT Salary ORDER BY Salary LIMIT 1, 1").unwrap();
    assert_eq!(column(&tail, 0), vec!["20"]);
}

#[test]
fn test_bracketed_and_index_columns() {
    let result = run(&people(), "SELECT [Start Date], #1 AS Who WHERE Dept = \"A\"").unwrap();
    assert_eq!(result.columns(), &["Start Date".to_string(), "Who".to_string()]);
    assert_eq!(column(&result, 1), vec!["ann", "cid"]);
}

#[test]
fn test_dates_compare_chronologically() {
    let result = run(
        &people(),
        "SELECT Name WHERE [Start Date] < PARSE(\"date\", \"2020-01-01\") ORDER BY Name",
    )
    .unwrap();
    assert_eq!(column(&result, 0), vec!["ann", "dee"]);
}

#[test]
fn test_is_null_and_celltype() {
    let sheet = people();
    let nulls = run(&sheet, "SELECT Name WHERE Salary IS NULL").unwrap();
    assert_eq!(column(&nulls, 0), vec!["bob"]);

    let doubles = run(&sheet, "SELECT Name WHERE CELLTYPE(Salary) = \"double\"").unwrap();
    assert_eq!(column(&doubles, 0), vec!["cid"]);

    let numeric = run(&sheet, "SELECT Name WHERE CELLTYPE(Salary) = \"numeric\"").unwrap();
    assert_eq!(numeric.row_count(), 4);
}

#[test]
fn test_missing_cells_fail_every_comparison() {
    let sheet = people();
    for op in ["<", "<=", "=", "<>", ">=", ">"] {
        let result = run(&sheet, &format!("SELECT Name WHERE Salary {} 0", op)).unwrap();
        assert!(!column(&result, 0).contains(&"bob".to_string()), "operator {}", op);
    }
}

#[test]
fn test_regexp_matches_whole_content() {
    let sheet = people();
    let result = run(&sheet, "SELECT Name WHERE Name REGEXP \"[a-c].*\"").unwrap();
    assert_eq!(column(&result, 0), vec!["ann", "bob", "cid"]);
    let partial = run(&sheet, "SELECT Name WHERE Name REGEXP \"b\"").unwrap();
    assert_eq!(partial.row_count(), 0);
}

#[test]
fn test_boolean_logic() {
    let sheet = people();
    let result = run(
        &sheet,
        "SELECT Name WHERE NOT Dept = \"A\" AND (Salary > 5000 OR Name = \"eve\")",
    )
    .unwrap();
    assert_eq!(column(&result, 0), vec!["dee", "eve"]);

    let implicit = run(&sheet, "SELECT Name WHERE Dept = \"B\" Salary < 4000").unwrap();
    assert_eq!(column(&implicit, 0), vec!["eve"]);
}

#[test]
fn test_string_fallback_comparison() {
    let result = run(&people(), "SELECT Name WHERE Name > 5").unwrap();
    assert_eq!(result.row_count(), 5);
}

#[test]
fn test_unknown_column_is_bind_error() {
    assert!(matches!(
        run(&staff(), "SELECT Dept WHERE Bonus > 1"),
        Err(EngineError::Bind(_))
    ));
    assert!(matches!(run(&staff(), "SELECT #3"), Err(EngineError::Bind(_))));
}

#[test]
fn test_evaluate_with_placeholders() {
    let bindings: Bindings = [("col", "Salary"), ("dept", "A")].into_iter().collect();
    let result = evaluate(
        &staff(),
        "SELECT @{col} WHERE Dept = \"@{dept}\" ORDER BY @{col} DESC",
        &bindings,
    )
    .unwrap();
    assert_eq!(result.cell(0, 0), Some(&CellValue::Long(30)));
    assert_eq!(result.cell(1, 0), Some(&CellValue::Long(10)));
}

#[test]
fn test_sampling_keeps_requested_count() {
    let sheet = people();
    let sample = run(&sheet, "SELECT 2").unwrap();
    assert_eq!(sample.row_count(), 2);
    assert_eq!(sample.columns(), sheet.columns());
    let all = run(&sheet, "SELECT 0.99").unwrap();
    assert_eq!(all.row_count(), 5);
}

#[test]
fn test_large_ids_match_exactly() {
    let ids = sheet(
        &["id"],
        &[&["9007199254740992"], &["9007199254740993"], &["1800000000000000001"]],
    );
    let result = run(&ids, "SELECT * WHERE id = 9007199254740993").unwrap();
    assert_eq!(column(&result, 0), vec!["9007199254740993"]);

    let remaining = run(&ids, "DELETE WHERE id = 9007199254740992").unwrap();
    assert_eq!(remaining.row_count(), 2);

    let ordered = run(&ids, "SELECT * ORDER BY id DESC").unwrap();
    assert_eq!(
        column(&ordered, 0),
        vec!["1800000000000000001", "9007199254740993", "9007199254740992"]
    );
}

#[test]
fn test_order_by_mixed_types_ranks_numbers_first() {
    let mixed = sheet(&["v"], &[&["1a"], &["10"], &["9"], &["b"], &["?"]]);
    let result = run(&mixed, "SELECT * ORDER BY v").unwrap();
    assert_eq!(column(&result, 0), vec!["?", "9", "10", "1a", "b"]);
}
