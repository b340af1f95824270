//! Tests for the grouping primitive and its non-query consumers

use crate::helpers::{people, sheet};
use sheetql::binning::{DensityBinning, FixedWidthBinning};
use sheetql::ops::{collapse, histogram, split_by_group};
use sheetql::{
    group_rows, CancelToken, CellValue, EmptyKeyPolicy, EngineError, GroupKey, GroupMode,
    GroupOptions, Sheet,
};

fn keys(sheet: &Sheet, key_columns: &[usize], mode: GroupMode) -> Vec<(String, Vec<usize>)> {
    group_rows(sheet, key_columns, &GroupOptions::with_mode(mode), &CancelToken::new())
        .unwrap()
        .into_iter()
        .map(|(key, rows)| (key.parts().join("/"), rows))
        .collect()
}

#[test]
fn test_streaming_keeps_first_seen_order() {
    let groups = keys(&people(), &[1], GroupMode::Streaming);
    assert_eq!(
        groups,
        vec![
            ("A".to_string(), vec![0, 2]),
            ("B".to_string(), vec![1, 4]),
            ("C".to_string(), vec![3]),
        ]
    );
}

#[test]
fn test_sort_then_partition_orders_by_key() {
    let data = sheet(&["k"], &[&["b"], &["a"], &["b"], &["c"], &["a"]]);
    let groups = keys(&data, &[0], GroupMode::SortThenPartition);
    assert_eq!(
        groups,
        vec![
            ("a".to_string(), vec![1, 4]),
            ("b".to_string(), vec![0, 2]),
            ("c".to_string(), vec![3]),
        ]
    );
}

#[test]
fn test_presorted_requires_sorted_input() {
    let sorted = sheet(&["k"], &[&["a"], &["a"], &["b"]]);
    assert_eq!(keys(&sorted, &[0], GroupMode::Presorted).len(), 2);

    let unsorted = sheet(&["k"], &[&["a"], &["b"], &["a"]]);
    assert!(matches!(
        group_rows(
            &unsorted,
            &[0],
            &GroupOptions::with_mode(GroupMode::Presorted),
            &CancelToken::new()
        ),
        Err(EngineError::InvalidInput(_))
    ));
}

#[test]
fn test_keys_compare_as_strings() {
    let mut data = Sheet::new(vec!["k".to_string()]).unwrap();
    data.push_values(vec![CellValue::Long(1)]).unwrap();
    data.push_values(vec![CellValue::String("1".to_string())]).unwrap();
    data.push_values(vec![CellValue::Double(1.5)]).unwrap();
    let groups = keys(&data, &[0], GroupMode::Streaming);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].1, vec![0, 1]);
}

#[test]
fn test_missing_keys_use_sentinel() {
    let data = sheet(&["k", "v"], &[&["?", "1"], &["x", "2"]]).with_missing("?");
    let mut sparse = data.clone();
    sparse.row_mut(1).unwrap().remove(0);
    let grouping = group_rows(&sparse, &[0], &GroupOptions::default(), &CancelToken::new()).unwrap();
    assert_eq!(grouping.len(), 1);
    assert_eq!(grouping.get(&GroupKey::new(vec!["?".to_string()])), Some(&[0, 1][..]));
}

#[test]
fn test_composite_keys() {
    let data = sheet(
        &["a", "b"],
        &[&["x", "1"], &["x", "2"], &["x", "1"], &["y", "1"]],
    );
    let groups = keys(&data, &[0, 1], GroupMode::Streaming);
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0], ("x/1".to_string(), vec![0, 2]));
}

#[test]
fn test_empty_key_policies() {
    let data = people();
    let cancel = CancelToken::new();
    assert!(matches!(
        group_rows(&data, &[], &GroupOptions::default(), &cancel),
        Err(EngineError::InvalidInput(_))
    ));
    let whole = GroupOptions {
        mode: GroupMode::Streaming,
        empty_keys: EmptyKeyPolicy::WholeSheet,
    };
    let grouping = group_rows(&data, &[], &whole, &cancel).unwrap();
    assert_eq!(grouping.len(), 1);
    assert_eq!(grouping.iter().next().map(|(_, rows)| rows.len()), Some(5));
}

#[test]
fn test_out_of_range_key_is_bind_error() {
    assert!(matches!(
        group_rows(&people(), &[9], &GroupOptions::default(), &CancelToken::new()),
        Err(EngineError::Bind(_))
    ));
}

#[test]
fn test_cancelled_grouping() {
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        group_rows(&people(), &[1], &GroupOptions::default(), &cancel),
        Err(EngineError::Cancelled)
    ));
}

#[test]
fn test_split_and_collapse() {
    let data = people();
    let cancel = CancelToken::new();
    let subsets = split_by_group(&data, &[1], GroupMode::SortThenPartition, &cancel).unwrap();
    let names: Vec<String> = subsets.iter().map(|(key, _)| key.to_string()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(subsets[1].1.content_string(0, 0), "bob");
    assert_eq!(subsets[1].1.columns(), data.columns());

    let collapsed = collapse(&data, &[1], ";", &cancel).unwrap();
    assert_eq!(collapsed.row_count(), 3);
    assert_eq!(collapsed.content_string(0, 0), "ann;cid");
    assert_eq!(collapsed.content_string(1, 3), "3900");
}

#[test]
fn test_histogram_with_other_algorithms() {
    let data = sheet(&["v"], &[&["1"], &["2"], &["2"], &["3"], &["8"], &["x"]]);
    let fixed = histogram(
        &data,
        0,
        &FixedWidthBinning {
            width: 5.0,
            min: Some(0.0),
            max: Some(10.0),
        },
    )
    .unwrap();
    assert_eq!(fixed.columns(), &["bin", "min", "max", "count"].map(String::from));
    assert_eq!(fixed.row_count(), 2);
    assert_eq!(fixed.cell(0, 3), Some(&CellValue::Long(4)));
    assert_eq!(fixed.cell(1, 3), Some(&CellValue::Long(1)));

    let density = histogram(&data, 0, &DensityBinning { per_bin: 2 }).unwrap();
    let total: i64 = (0..density.row_count())
        .filter_map(|r| match density.cell(r, 3) {
            Some(CellValue::Long(n)) => Some(*n),
            _ => None,
        })
        .sum();
    assert_eq!(total, 5);
}
