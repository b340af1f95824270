//! Sheet module for sheetql
//!
//! This module provides the in-memory spreadsheet representation the engine
//! consumes and produces:
//!
//! - [`Row`]: a sparse mapping from column index to [`CellValue`]
//! - [`Header`]: the column names, unique within a sheet
//! - [`Sheet`]: one header plus an ordered sequence of rows
//!
//! A row never stores a pointer back to its sheet. Operations that need column
//! names take the header explicitly, and [`Row::rekey`] moves a row between
//! sheets by column name.

use std::collections::{BTreeMap, HashMap};

use crate::cell::{compare_for_sort, CellValue, DEFAULT_MISSING};
use crate::error::{EngineError, EngineResult};

/// Sort direction for a column in ORDER BY or sort-then-partition grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Sort in ascending order (default)
    Ascending,
    /// Sort in descending order
    Descending,
}

/// A sparse row of cells keyed by column index
///
/// An absent entry means the cell was never set. An entry holding
/// [`CellValue::Missing`] was explicitly set to the missing sentinel. Both read
/// as "no value" for `IS NULL` and aggregates, but they are kept apart so that a
/// copied sheet is structurally identical to its source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: BTreeMap<usize, CellValue>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dense row from values in column order
    pub fn from_values(values: Vec<CellValue>) -> Self {
        Row {
            cells: values.into_iter().enumerate().collect(),
        }
    }

    /// Get the cell at a column, if one was set
    pub fn cell(&self, col: usize) -> Option<&CellValue> {
        self.cells.get(&col)
    }

    /// Set the cell at a column, creating it if necessary
    pub fn set(&mut self, col: usize, value: CellValue) {
        self.cells.insert(col, value);
    }

    /// Remove the cell at a column, making it absent
    pub fn remove(&mut self, col: usize) -> Option<CellValue> {
        self.cells.remove(&col)
    }

    /// True if the cell is absent or missing
    pub fn is_null(&self, col: usize) -> bool {
        self.cells.get(&col).map_or(true, CellValue::is_missing)
    }

    /// Number of cells that were set
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Highest column index that holds a cell
    pub fn last_column(&self) -> Option<usize> {
        self.cells.keys().next_back().copied()
    }

    /// Iterate over set cells in column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &CellValue)> {
        self.cells.iter().map(|(col, cell)| (*col, cell))
    }

    /// String content of a cell, with `missing` standing in for absent and
    /// missing cells
    pub fn content_string(&self, col: usize, missing: &str) -> String {
        match self.cells.get(&col) {
            Some(cell) => cell.display_with(missing),
            None => missing.to_string(),
        }
    }

    /// Copy this row onto another header, matching cells by column name
    ///
    /// Cells whose column name does not exist in `to` are dropped.
    pub fn rekey(&self, from: &Header, to: &Header) -> Row {
        let mut row = Row::new();
        for (col, cell) in self.iter() {
            if let Some(target) = from.name(col).and_then(|name| to.index_of(name)) {
                row.set(target, cell.clone());
            }
        }
        row
    }
}

/// Column names of a sheet
///
/// Names are unique and case-sensitive. The column count of a sheet is the
/// number of names in its header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    /// Create a header, rejecting duplicate names
    pub fn new(names: Vec<String>) -> EngineResult<Self> {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(EngineError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Header { names, index })
    }

    /// Column names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if there are no columns
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the column at an index
    pub fn name(&self, col: usize) -> Option<&str> {
        self.names.get(col).map(String::as_str)
    }

    /// Index of the column with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn push(&mut self, name: String) -> EngineResult<usize> {
        if self.index.contains_key(&name) {
            return Err(EngineError::DuplicateColumn(name));
        }
        let col = self.names.len();
        self.index.insert(name.clone(), col);
        self.names.push(name);
        Ok(col)
    }
}

/// Represents an in-memory spreadsheet
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Name of the sheet, usually derived from its source file
    name: String,

    /// Column names
    header: Header,

    /// Rows of data
    rows: Vec<Row>,

    /// Text that denotes a missing cell when rendering or keying rows
    missing: String,
}

impl Sheet {
    /// Create an empty sheet with the given columns
    pub fn new(columns: Vec<String>) -> EngineResult<Self> {
        Ok(Sheet {
            name: String::new(),
            header: Header::new(columns)?,
            rows: Vec::new(),
            missing: DEFAULT_MISSING.to_string(),
        })
    }

    /// Set the sheet name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the missing-value sentinel
    pub fn with_missing(mut self, missing: impl Into<String>) -> Self {
        self.missing = missing.into();
        self
    }

    /// An empty sheet with the same name, header and sentinel as this one
    pub fn header_only(&self) -> Self {
        Sheet {
            name: self.name.clone(),
            header: self.header.clone(),
            rows: Vec::new(),
            missing: self.missing.clone(),
        }
    }

    /// An empty sheet with new columns but this sheet's name and sentinel
    pub fn derive(&self, columns: Vec<String>) -> EngineResult<Self> {
        Ok(Sheet {
            name: self.name.clone(),
            header: Header::new(columns)?,
            rows: Vec::new(),
            missing: self.missing.clone(),
        })
    }

    /// Get the name of the sheet
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the missing-value sentinel
    pub fn missing(&self) -> &str {
        &self.missing
    }

    /// Get the header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Get the column names in order
    pub fn columns(&self) -> &[String] {
        self.header.names()
    }

    /// Get the column count
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Get the index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.index_of(name)
    }

    /// Append a column, returning its index
    pub fn add_column(&mut self, name: impl Into<String>) -> EngineResult<usize> {
        self.header.push(name.into())
    }

    /// Get the rows of the sheet
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get a row by index
    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    /// Get a mutable row by index
    pub fn row_mut(&mut self, idx: usize) -> Option<&mut Row> {
        self.rows.get_mut(idx)
    }

    /// Get the row count
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a cell by row and column index
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.cell(col))
    }

    /// Add a row to the sheet
    ///
    /// The row may be sparse but must not hold cells beyond the column count.
    pub fn add_row(&mut self, row: Row) -> EngineResult<()> {
        if let Some(last) = row.last_column() {
            if last >= self.column_count() {
                return Err(EngineError::InvalidInput(format!(
                    "Row has a cell in column {}, but sheet '{}' has {} columns",
                    last + 1,
                    self.name,
                    self.column_count()
                )));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Add a dense row of values
    pub fn push_values(&mut self, values: Vec<CellValue>) -> EngineResult<()> {
        self.add_row(Row::from_values(values))
    }

    /// Append a row that belongs to another sheet, matching cells by column name
    pub fn append_rekeyed(&mut self, source: &Sheet, row: &Row) {
        self.rows.push(row.rekey(source.header(), &self.header));
    }

    /// Update a single cell, creating it if it was absent
    pub fn set_cell(&mut self, row_idx: usize, col_idx: usize, value: CellValue) -> EngineResult<()> {
        if col_idx >= self.column_count() {
            return Err(EngineError::InvalidInput(format!(
                "Column index {} is out of bounds (sheet has {} columns)",
                col_idx,
                self.column_count()
            )));
        }
        let row_count = self.rows.len();
        let row = self.rows.get_mut(row_idx).ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "Row index {} is out of bounds (sheet has {} rows)",
                row_idx, row_count
            ))
        })?;
        row.set(col_idx, value);
        Ok(())
    }

    /// Replace all rows with a new set
    pub fn replace_rows(&mut self, new_rows: Vec<Row>) {
        self.rows = new_rows;
    }

    /// Keep only the rows whose entry in `keep` is true
    pub fn retain_by_mask(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(true));
    }

    /// Content string of a cell, using the sheet's sentinel for absent and
    /// missing cells
    pub fn content_string(&self, row: usize, col: usize) -> String {
        match self.rows.get(row) {
            Some(r) => r.content_string(col, &self.missing),
            None => self.missing.clone(),
        }
    }

    /// Create a new sheet containing the given rows, in the given order
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        let mut result = self.header_only();
        result.rows = indices
            .iter()
            .filter_map(|&i| self.rows.get(i).cloned())
            .collect();
        result
    }

    /// Create a new sheet with only the specified columns and optional aliases
    ///
    /// # Arguments
    /// * `column_specs` - Column indices to keep, each with an optional new name
    ///
    /// # Returns
    /// * `Ok(Sheet)` containing only the specified columns, aliases applied
    /// * `Err` if a column index is out of bounds or the result would repeat a name
    pub fn project(&self, column_specs: &[(usize, Option<String>)]) -> EngineResult<Self> {
        let columns = column_specs
            .iter()
            .map(|(idx, alias)| match alias {
                Some(alias) => Ok(alias.clone()),
                None => self
                    .header
                    .name(*idx)
                    .map(str::to_string)
                    .ok_or_else(|| EngineError::unknown_column(format!("#{}", idx + 1))),
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let mut result = self.derive(columns)?;
        result.rows = self
            .rows
            .iter()
            .map(|row| {
                let mut projected = Row::new();
                for (target, (source, _)) in column_specs.iter().enumerate() {
                    if let Some(cell) = row.cell(*source) {
                        projected.set(target, cell.clone());
                    }
                }
                projected
            })
            .collect();

        Ok(result)
    }

    /// Row indices in the order a stable sort by the given columns would put them
    pub fn sorted_row_order(&self, sort_columns: &[(usize, SortDirection)]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| {
            for &(col, direction) in sort_columns {
                let ordering = compare_for_sort(self.rows[a].cell(col), self.rows[b].cell(col));
                if ordering != std::cmp::Ordering::Equal {
                    return match direction {
                        SortDirection::Ascending => ordering,
                        SortDirection::Descending => ordering.reverse(),
                    };
                }
            }
            std::cmp::Ordering::Equal
        });
        order
    }

    /// Sort the rows in place by one or more columns
    ///
    /// The sort is stable. Absent and missing cells sort first in ascending
    /// order and last in descending order.
    ///
    /// # Returns
    /// * `Err` if any column index is out of bounds
    pub fn sort_by_columns(&mut self, sort_columns: &[(usize, SortDirection)]) -> EngineResult<()> {
        for (col_idx, _) in sort_columns {
            if *col_idx >= self.column_count() {
                return Err(EngineError::Bind(format!(
                    "Column index {} out of bounds for sorting (sheet has {} columns)",
                    col_idx + 1,
                    self.column_count()
                )));
            }
        }

        let order = self.sorted_row_order(sort_columns);
        let mut old: Vec<Option<Row>> = std::mem::take(&mut self.rows).into_iter().map(Some).collect();
        self.rows = order.into_iter().filter_map(|i| old[i].take()).collect();
        Ok(())
    }
}
