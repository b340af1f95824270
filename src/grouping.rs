//! Row grouping for sheetql
//!
//! This module partitions the rows of a sheet by a composite key built from the
//! string content of designated key columns. It backs `GROUP BY` in the query
//! language and the per-group operations in [`crate::ops`].
//!
//! Keys compare as strings, not as typed values, so a numeric `1` and a string
//! `"1"` land in the same group. Absent and missing key cells contribute the
//! sheet's missing-value sentinel.

use std::collections::HashMap;
use std::fmt;

use crate::cancel::CancelToken;
use crate::error::{EngineError, EngineResult};
use crate::sheet::{Sheet, SortDirection};

/// Separator used when a key is rendered as a single string
pub const KEY_SEPARATOR: char = '\u{1f}';

/// How rows are partitioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupMode {
    /// Single pass in row order; groups appear in first-seen key order
    #[default]
    Streaming,
    /// Stable ascending sort by the key columns, then consecutive runs of equal
    /// keys; groups appear in key order
    SortThenPartition,
    /// Consecutive runs of equal keys in the current row order, without sorting
    ///
    /// The caller guarantees the sheet is already sorted by the key columns. A
    /// key that reappears after a different key is reported as invalid input.
    Presorted,
}

/// What an empty key-column list means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyKeyPolicy {
    /// Zero key columns is an input error
    #[default]
    Reject,
    /// Zero key columns puts every row into one group with an empty key
    WholeSheet,
}

/// Options for [`group_rows`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupOptions {
    /// Partitioning mode
    pub mode: GroupMode,
    /// Handling of an empty key-column list
    pub empty_keys: EmptyKeyPolicy,
}

impl GroupOptions {
    /// Options with the given mode and the default empty-key policy
    pub fn with_mode(mode: GroupMode) -> Self {
        GroupOptions {
            mode,
            ..Self::default()
        }
    }
}

/// The string content of a row's key columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(Vec<String>);

impl GroupKey {
    /// Build a key from its parts
    pub fn new(parts: Vec<String>) -> Self {
        GroupKey(parts)
    }

    /// Key content of one row
    pub fn for_row(sheet: &Sheet, row: usize, key_columns: &[usize]) -> Self {
        GroupKey(
            key_columns
                .iter()
                .map(|&col| sheet.content_string(row, col))
                .collect(),
        )
    }

    /// The key parts in key-column order
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", KEY_SEPARATOR)?;
            }
            f.write_str(part)?;
        }
        Ok(())
    }
}

/// Groups of row indices, in the order the grouping mode defines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping {
    groups: Vec<(GroupKey, Vec<usize>)>,
    lookup: HashMap<GroupKey, usize>,
}

impl Grouping {
    fn push(&mut self, key: GroupKey, row: usize) -> usize {
        match self.lookup.get(&key) {
            Some(&slot) => {
                self.groups[slot].1.push(row);
                slot
            }
            None => {
                let slot = self.groups.len();
                self.lookup.insert(key.clone(), slot);
                self.groups.push((key, vec![row]));
                slot
            }
        }
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True if there are no groups
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Row indices of the group with the given key
    pub fn get(&self, key: &GroupKey) -> Option<&[usize]> {
        self.lookup.get(key).map(|&slot| self.groups[slot].1.as_slice())
    }

    /// Iterate over groups
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &[usize])> {
        self.groups.iter().map(|(key, rows)| (key, rows.as_slice()))
    }

    /// Keys in group order
    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.iter().map(|(key, _)| key)
    }
}

impl IntoIterator for Grouping {
    type Item = (GroupKey, Vec<usize>);
    type IntoIter = std::vec::IntoIter<(GroupKey, Vec<usize>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Partition the rows of a sheet by the content of its key columns
///
/// # Arguments
/// * `sheet` - The sheet whose rows are grouped; it is never modified
/// * `key_columns` - 0-based indices of the key columns, in key order
/// * `options` - Grouping mode and empty-key policy
/// * `cancel` - Polled every [`crate::cancel::ROW_POLL_INTERVAL`] rows
///
/// # Returns
/// * `Ok(Grouping)` mapping each key to its row indices
/// * `Err(InvalidInput)` for an empty key list under [`EmptyKeyPolicy::Reject`]
/// * `Err(Bind)` if a key column does not exist
/// * `Err(Cancelled)` if cancellation was observed
pub fn group_rows(
    sheet: &Sheet,
    key_columns: &[usize],
    options: &GroupOptions,
    cancel: &CancelToken,
) -> EngineResult<Grouping> {
    if key_columns.is_empty() {
        return match options.empty_keys {
            EmptyKeyPolicy::Reject => Err(EngineError::InvalidInput(
                "At least one key column is required for grouping".to_string(),
            )),
            EmptyKeyPolicy::WholeSheet => {
                cancel.check()?;
                let mut grouping = Grouping::default();
                if sheet.row_count() > 0 {
                    grouping
                        .groups
                        .push((GroupKey::default(), (0..sheet.row_count()).collect()));
                    grouping.lookup.insert(GroupKey::default(), 0);
                }
                Ok(grouping)
            }
        };
    }

    for &col in key_columns {
        if col >= sheet.column_count() {
            return Err(EngineError::Bind(format!(
                "Key column {} out of bounds (sheet has {} columns)",
                col + 1,
                sheet.column_count()
            )));
        }
    }

    let order: Vec<usize> = match options.mode {
        GroupMode::Streaming | GroupMode::Presorted => (0..sheet.row_count()).collect(),
        GroupMode::SortThenPartition => {
            let sort_columns: Vec<(usize, SortDirection)> = key_columns
                .iter()
                .map(|&col| (col, SortDirection::Ascending))
                .collect();
            sheet.sorted_row_order(&sort_columns)
        }
    };

    let mut grouping = Grouping::default();
    let mut previous: Option<usize> = None;
    for (n, &row) in order.iter().enumerate() {
        cancel.check_row(n)?;
        let key = GroupKey::for_row(sheet, row, key_columns);
        if options.mode == GroupMode::Presorted {
            if let Some(&slot) = grouping.lookup.get(&key) {
                if previous != Some(slot) {
                    return Err(EngineError::InvalidInput(format!(
                        "Rows are not sorted by the key columns: key '{}' reappears at row {}",
                        key,
                        row + 1
                    )));
                }
            }
        }
        previous = Some(grouping.push(key, row));
    }

    log::trace!(
        "grouped {} rows into {} groups ({:?})",
        sheet.row_count(),
        grouping.len(),
        options.mode
    );
    Ok(grouping)
}
