//! Tabular row sources.
//!
//! Rows reach the converter as [`SourceRow`]s: an ordered column → text
//! mapping tagged with the originating sheet and row number. The
//! [`RowSource`] trait is the seam to whatever reads the spreadsheets;
//! [`SheetSet`] is the in-memory implementation, filled either by
//! [`workbook::read_workbook`] or directly in code.

pub mod workbook;

use indexmap::IndexMap;

use crate::error::SourceError;

pub use workbook::read_workbook;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// One data row of a sheet. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    sheet: String,
    index: usize,
    cells: IndexMap<String, String>,
}

impl SourceRow {
    /// Build a row; header names are trimmed and empty cells dropped.
    pub fn new<K, V>(sheet: &str, index: usize, cells: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let cells = cells
            .into_iter()
            .filter_map(|(k, v)| {
                let key = k.as_ref().trim();
                let value = v.as_ref().trim();
                (!key.is_empty() && !value.is_empty()).then(|| (key.to_string(), value.to_string()))
            })
            .collect();
        Self {
            sheet: sheet.to_string(),
            index,
            cells,
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Spreadsheet row number (the header is row 1).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of a column. Exact match first, then case-insensitive.
    pub fn get(&self, column: &str) -> Option<&str> {
        let column = column.trim();
        if let Some(v) = self.cells.get(column) {
            return Some(v);
        }
        self.cells
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Supplier of sheets and their rows.
pub trait RowSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Column headers of a sheet, in order.
    fn columns(&self, sheet: &str) -> SourceResult<&[String]>;

    /// Data rows of a sheet, in order.
    fn rows(&self, sheet: &str) -> SourceResult<&[SourceRow]>;

    /// Resolve a sheet name case-insensitively, ignoring surrounding whitespace.
    fn find_sheet(&self, name: &str) -> Option<String> {
        let wanted = name.trim().to_lowercase();
        self.sheet_names()
            .into_iter()
            .find(|s| s.trim().to_lowercase() == wanted)
    }
}

#[derive(Debug, Clone, Default)]
struct Sheet {
    columns: Vec<String>,
    rows: Vec<SourceRow>,
}

/// In-memory sheets, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SheetSet {
    sheets: IndexMap<String, Sheet>,
}

impl SheetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet from a header and rows of cell text; rows are numbered
    /// from 2 as in a spreadsheet. Cells beyond the header are ignored.
    pub fn add_sheet(&mut self, name: &str, header: &[&str], rows: &[&[&str]]) -> &mut Self {
        self.declare_sheet(name, header.iter().map(|h| h.to_string()).collect());
        for (i, row) in rows.iter().enumerate() {
            let cells = header.iter().zip(row.iter()).map(|(h, v)| (*h, *v));
            self.push_row(SourceRow::new(name, i + 2, cells));
        }
        self
    }

    /// Create (or reset the header of) a sheet.
    pub fn declare_sheet(&mut self, name: &str, columns: Vec<String>) {
        let columns = columns
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        self.sheets.entry(name.to_string()).or_default().columns = columns;
    }

    /// Append a row to its sheet; empty rows are dropped.
    pub fn push_row(&mut self, row: SourceRow) {
        if row.is_empty() {
            return;
        }
        self.sheets
            .entry(row.sheet().to_string())
            .or_default()
            .rows
            .push(row);
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl RowSource for SheetSet {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn columns(&self, sheet: &str) -> SourceResult<&[String]> {
        self.sheets
            .get(sheet)
            .map(|s| s.columns.as_slice())
            .ok_or_else(|| SourceError::SheetNotFound {
                sheet: sheet.to_string(),
            })
    }

    fn rows(&self, sheet: &str) -> SourceResult<&[SourceRow]> {
        self.sheets
            .get(sheet)
            .map(|s| s.rows.as_slice())
            .ok_or_else(|| SourceError::SheetNotFound {
                sheet: sheet.to_string(),
            })
    }
}
