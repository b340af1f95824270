//! Property tests for the query and grouping laws

use proptest::prelude::*;

use crate::helpers::run;
use sheetql::{group_rows, CancelToken, CellValue, GroupOptions, Sheet};

fn build(rows: &[(String, Option<i64>)]) -> Sheet {
    let mut sheet = Sheet::new(vec!["k".to_string(), "v".to_string()]).unwrap();
    for (key, value) in rows {
        sheet
            .push_values(vec![
                CellValue::String(key.clone()),
                value.map_or(CellValue::Missing, CellValue::Long),
            ])
            .unwrap();
    }
    sheet
}

fn row_strings(sheet: &Sheet) -> Vec<Vec<String>> {
    (0..sheet.row_count())
        .map(|r| (0..sheet.column_count()).map(|c| sheet.content_string(r, c)).collect())
        .collect()
}

fn rows_strategy() -> impl Strategy<Value = Vec<(String, Option<i64>)>> {
    proptest::collection::vec(("[a-d]", proptest::option::of(-20i64..20)), 0..40)
}

fn op_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["<", "<=", "=", "<>", ">=", ">"])
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0),
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn select_star_is_identity(rows in rows_strategy()) {
        let sheet = build(&rows);
        prop_assert_eq!(run(&sheet, "SELECT *").unwrap(), sheet);
    }

    #[test]
    fn filter_and_delete_are_complementary(
        rows in rows_strategy(),
        op in op_strategy(),
        threshold in -20i64..20,
    ) {
        let sheet = build(&rows);
        let condition = format!("v {} {}", op, threshold);
        let kept = run(&sheet, &format!("SELECT * WHERE {}", condition)).unwrap();
        let deleted = run(&sheet, &format!("DELETE WHERE {}", condition)).unwrap();

        let mut combined = row_strings(&kept);
        combined.extend(row_strings(&deleted));
        combined.sort();
        let mut original = row_strings(&sheet);
        original.sort();
        prop_assert_eq!(combined, original);
    }

    #[test]
    fn limit_is_a_prefix(rows in rows_strategy(), k in 0usize..50) {
        let sheet = build(&rows);
        let ordered = run(&sheet, "SELECT * ORDER BY v DESC, k").unwrap();
        let limited = run(&sheet, &format!("SELECT * ORDER BY v DESC, k LIMIT {}", k)).unwrap();
        let expected = k.min(sheet.row_count());
        prop_assert_eq!(limited.row_count(), expected);
        prop_assert_eq!(&row_strings(&limited)[..], &row_strings(&ordered)[..expected]);
    }

    #[test]
    fn regrouping_a_group_is_a_no_op(rows in rows_strategy()) {
        let sheet = build(&rows);
        let cancel = CancelToken::new();
        let options = GroupOptions::default();
        let grouping = group_rows(&sheet, &[0], &options, &cancel).unwrap();
        for (key, members) in grouping.iter() {
            let subset = sheet.take_rows(members);
            let regrouped = group_rows(&subset, &[0], &options, &cancel).unwrap();
            prop_assert_eq!(regrouped.len(), 1);
            let (inner_key, inner_rows) = regrouped.iter().next().unwrap();
            prop_assert_eq!(inner_key, key);
            prop_assert_eq!(inner_rows.to_vec(), (0..members.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn count_star_matches_group_size(rows in rows_strategy()) {
        let sheet = build(&rows);
        let grouping = group_rows(&sheet, &[0], &GroupOptions::default(), &CancelToken::new()).unwrap();
        let counts = run(&sheet, "SELECT COUNT(*) GROUP BY k").unwrap();
        prop_assert_eq!(counts.row_count(), grouping.len());
        for (row, (_, members)) in grouping.iter().enumerate() {
            prop_assert_eq!(counts.cell(row, 1), Some(&CellValue::Long(members.len() as i64)));
        }
    }
}
