//! Test helpers for sheetql library tests

use sheetql::{evaluate_copy, CellValue, EngineResult, EvalOptions, Query, Sheet};

/// Build a sheet from text cells, inferring types the way file loading does
pub fn sheet(columns: &[&str], rows: &[&[&str]]) -> Sheet {
    let mut sheet = Sheet::new(columns.iter().map(|c| c.to_string()).collect()).unwrap();
    for row in rows {
        sheet
            .push_values(row.iter().map(|text| CellValue::infer(text, "?")).collect())
            .unwrap();
    }
    sheet
}

/// The `[Dept, Salary]` sheet used by most scenarios
pub fn staff() -> Sheet {
    sheet(&["Dept", "Salary"], &[&["A", "10"], &["B", "20"], &["A", "30"]])
}

/// A wider sheet with blanks in names, dates and missing cells
pub fn people() -> Sheet {
    sheet(
        &["Name", "Dept", "Start Date", "Salary"],
        &[
            &["ann", "A", "2019-03-01", "5000"],
            &["bob", "B", "2021-07-15", "?"],
            &["cid", "A", "2020-01-01", "4200.5"],
            &["dee", "C", "2018-11-30", "7100"],
            &["eve", "B", "2022-02-02", "3900"],
        ],
    )
}

/// Parse and evaluate a query against a copy of `sheet`
pub fn run(sheet: &Sheet, text: &str) -> EngineResult<Sheet> {
    evaluate_copy(sheet, &Query::parse(text)?, &EvalOptions::default())
}

/// Content strings of one column, top to bottom
pub fn column(sheet: &Sheet, col: usize) -> Vec<String> {
    (0..sheet.row_count())
        .map(|r| sheet.content_string(r, col))
        .collect()
}
