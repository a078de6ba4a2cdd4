//! `.xlsx` reader built on `umya-spreadsheet`.
//!
//! The first row of each sheet is the header. Cell values are read as text;
//! numbers that the spreadsheet stores as floats lose their trailing `.0`
//! so that `11` in a cell reads as `"11"`.

use std::path::Path;

use umya_spreadsheet::Worksheet;

use crate::error::SourceError;

use super::{SheetSet, SourceResult, SourceRow};

/// Read every sheet of a workbook into memory.
pub fn read_workbook(path: &Path) -> SourceResult<SheetSet> {
    let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| SourceError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut set = SheetSet::new();
    for sheet in book.get_sheet_collection() {
        let name = sheet.get_name().to_string();
        let (max_col, max_row) = sheet.get_highest_column_and_row();

        let header: Vec<Option<String>> = (1..=max_col).map(|c| cell_text(sheet, c, 1)).collect();
        set.declare_sheet(&name, header.iter().flatten().cloned().collect());

        let mut rows = 0usize;
        for r in 2..=max_row {
            let cells = header.iter().enumerate().filter_map(|(i, h)| {
                let h = h.as_ref()?;
                let value = cell_text(sheet, i as u32 + 1, r)?;
                Some((h.clone(), value))
            });
            let row = SourceRow::new(&name, r as usize, cells);
            if !row.is_empty() {
                rows += 1;
                set.push_row(row);
            }
        }
        tracing::debug!(sheet = %name, columns = header.len(), rows, "sheet loaded");
    }

    tracing::info!(path = %path.display(), sheets = set.len(), "workbook read");
    Ok(set)
}

fn cell_text(sheet: &Worksheet, col: u32, row: u32) -> Option<String> {
    let cell = sheet.get_cell((col, row))?;
    clean_cell(&cell.get_value())
}

/// Trim a raw cell value; empty cells become `None` and integral floats
/// drop their `.0` suffix.
pub fn clean_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(int) = trimmed.strip_suffix(".0") {
        if !int.is_empty() && int.trim_start_matches('-').chars().all(|c| c.is_ascii_digit()) {
            return Some(int.to_string());
        }
    }
    Some(trimmed.to_string())
}
