//! Workbook-backed cell document
//!
//! Only the first worksheet is addressed. Opening and saving go through the
//! spreadsheet library so formatting, protected columns and every cell the
//! tag generator does not touch survive unchanged.

use crate::document::{CellDocument, CellValue};
use buffet_common::{Error, Result};
use std::path::Path;
use umya_spreadsheet::{Spreadsheet, Worksheet};

const FIRST_SHEET: usize = 0;

pub struct XlsxDocument {
    book: Spreadsheet,
}

impl XlsxDocument {
    /// Open an existing .xlsx file
    pub fn open(path: &Path) -> Result<Self> {
        let book = umya_spreadsheet::reader::xlsx::read(path)
            .map_err(|e| Error::Spreadsheet(format!("Cannot read {}: {}", path.display(), e)))?;

        if book.get_sheet(&FIRST_SHEET).is_none() {
            return Err(Error::Spreadsheet(format!(
                "{} has no worksheet",
                path.display()
            )));
        }

        Ok(Self { book })
    }

    /// New workbook with a single empty sheet
    pub fn new() -> Self {
        Self {
            book: umya_spreadsheet::new_file(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, path)
            .map_err(|e| Error::Spreadsheet(format!("Cannot write {}: {}", path.display(), e)))
    }

    fn sheet(&self) -> Option<&Worksheet> {
        self.book.get_sheet(&FIRST_SHEET)
    }
}

impl Default for XlsxDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CellDocument for XlsxDocument {
    fn value(&self, row: u32, col: u32) -> Option<String> {
        let text = self.sheet()?.get_cell((col, row))?.get_value().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn set(&mut self, row: u32, col: u32, value: CellValue) {
        let Some(sheet) = self.book.get_sheet_mut(&FIRST_SHEET) else {
            return;
        };
        let cell = sheet.get_cell_mut((col, row));
        match value {
            CellValue::Empty => {
                cell.set_value("");
            }
            CellValue::Text(text) => {
                cell.set_value(text);
            }
            CellValue::Number(n) => {
                cell.set_value_number(n);
            }
        }
    }

    fn highest_row(&self) -> u32 {
        self.sheet()
            .map(|s| s.get_highest_column_and_row().1)
            .unwrap_or(0)
    }

    fn highest_column(&self) -> u32 {
        self.sheet()
            .map(|s| s.get_highest_column_and_row().0)
            .unwrap_or(0)
    }
}
