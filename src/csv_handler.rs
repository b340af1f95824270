//! Delimited file handling for sheetql
//!
//! This module loads delimiter-separated files into sheets and writes sheets
//! back out. It provides:
//!
//! - Field separator resolution, similar to awk's -F option: comma for `.csv`
//!   files, tab for anything else, and `\t` spelled out as a tab
//! - Cell type inference for every field, honouring the missing-value sentinel
//! - Rendering of sheets to any writer, used both for stdout and for `--write`
//!
//! The first record of a file is always the header. Short records leave their
//! trailing cells absent, and empty fields are absent cells.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;

use crate::cell::CellValue;
use crate::error::{EngineError, EngineResult};
use crate::sheet::{Row, Sheet};

/// Reads and writes sheets with a fixed delimiter and missing-value sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvHandler {
    /// Field separator byte
    delimiter: u8,

    /// Text denoting a missing cell
    missing: String,
}

impl CsvHandler {
    /// Create a handler for an explicit delimiter
    pub fn new(delimiter: u8, missing: impl Into<String>) -> Self {
        CsvHandler {
            delimiter,
            missing: missing.into(),
        }
    }

    /// Create a handler for a file, resolving the field separator
    ///
    /// # Arguments
    /// * `path` - The file whose extension picks the default separator
    /// * `field_separator` - Separator given on the command line, if any
    /// * `missing` - Missing-value sentinel
    ///
    /// # Returns
    /// * `Ok(CsvHandler)` ready to load or save `path`
    /// * `Err(InvalidInput)` if the separator is not a single byte
    pub fn for_path(
        path: &Path,
        field_separator: Option<&str>,
        missing: impl Into<String>,
    ) -> EngineResult<Self> {
        let delimiter = match field_separator {
            Some(sep) => parse_delimiter(sep)?,
            None => default_delimiter(path),
        };
        Ok(Self::new(delimiter, missing))
    }

    /// The field separator byte
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// The missing-value sentinel
    pub fn missing(&self) -> &str {
        &self.missing
    }

    /// Load a delimited file into a sheet named after the file stem
    ///
    /// # Returns
    /// * `Ok(Sheet)` with inferred cell types
    /// * `Err` if the file cannot be opened or parsed, or holds duplicate column
    ///   names or records longer than the header
    pub fn load_sheet(&self, path: &Path) -> EngineResult<Sheet> {
        let file = File::open(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let sheet = self.read_sheet(BufReader::new(file))?.with_name(name);
        debug!(
            "Loaded '{}': {} column(s), {} row(s)",
            path.display(),
            sheet.column_count(),
            sheet.row_count()
        );
        Ok(sheet)
    }

    /// Read a sheet from any reader
    pub fn read_sheet<R: Read>(&self, reader: R) -> EngineResult<Sheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();

        let mut sheet = Sheet::new(headers)?.with_missing(self.missing.clone());

        for result in csv_reader.records() {
            let record = result?;
            let mut row = Row::new();
            for (col, field) in record.iter().enumerate() {
                if !field.is_empty() {
                    row.set(col, CellValue::infer(field, &self.missing));
                }
            }
            sheet.add_row(row)?;
        }

        Ok(sheet)
    }

    /// Write a sheet to any writer, header first
    ///
    /// Missing cells render as the sheet's sentinel and absent cells as empty
    /// fields.
    pub fn write_sheet<W: Write>(&self, sheet: &Sheet, writer: W) -> EngineResult<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        csv_writer.write_record(sheet.columns())?;

        for row in sheet.rows() {
            let record: Vec<String> = (0..sheet.column_count())
                .map(|col| {
                    row.cell(col)
                        .map(|cell| cell.display_with(sheet.missing()))
                        .unwrap_or_default()
                })
                .collect();
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Save a sheet to a file, replacing its contents
    pub fn save_sheet(&self, sheet: &Sheet, path: &Path) -> EngineResult<()> {
        let file = File::create(path)?;
        self.write_sheet(sheet, BufWriter::new(file))?;
        debug!("Wrote {} row(s) to '{}'", sheet.row_count(), path.display());
        Ok(())
    }
}

/// Parse a field separator given as text
///
/// A single byte is used as is; `\t` spelled out denotes a tab.
pub fn parse_delimiter(sep: &str) -> EngineResult<u8> {
    match sep.as_bytes() {
        [byte] => Ok(*byte),
        b"\\t" => Ok(b'\t'),
        _ => Err(EngineError::InvalidInput(format!(
            "Invalid delimiter: {}. Must be a single character.",
            sep
        ))),
    }
}

/// Comma for `.csv` files, tab otherwise
pub fn default_delimiter(path: &Path) -> u8 {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}
