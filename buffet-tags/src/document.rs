//! Cell-addressable documents
//!
//! The tag generator, bulk importer and name extractor only ever address
//! single cells by (row, column), both 1-based. [`CellDocument`] is that
//! contract; [`crate::xlsx::XlsxDocument`] backs it with a workbook and
//! [`GridDocument`] keeps cells in memory.

use std::collections::BTreeMap;

/// Value written into a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Cleared cell (written as an empty string)
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Text as a reader sees it; `None` for empty cells
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
        }
    }
}

/// Integers render without a fractional part, as spreadsheets show them
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub trait CellDocument {
    /// Cell text, `None` when the cell is absent or empty
    fn value(&self, row: u32, col: u32) -> Option<String>;

    fn set(&mut self, row: u32, col: u32, value: CellValue);

    /// Last row holding any cell (0 for an empty document)
    fn highest_row(&self) -> u32;

    /// Last column holding any cell (0 for an empty document)
    fn highest_column(&self) -> u32;
}

/// In-memory document
#[derive(Debug, Clone, Default)]
pub struct GridDocument {
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl GridDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from rows of text, starting at row 1, column 1
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = Self::new();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, text) in row.into_iter().enumerate() {
                let text = text.into();
                if !text.is_empty() {
                    doc.set(r as u32 + 1, c as u32 + 1, CellValue::Text(text));
                }
            }
        }
        doc
    }

    /// Raw stored value, distinguishing a cleared cell from an untouched one
    pub fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Every (row, col) that has been written
    pub fn written_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.cells.keys().copied()
    }
}

impl CellDocument for GridDocument {
    fn value(&self, row: u32, col: u32) -> Option<String> {
        self.cells.get(&(row, col)).and_then(CellValue::as_text)
    }

    fn set(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.insert((row, col), value);
    }

    fn highest_row(&self) -> u32 {
        self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0)
    }

    fn highest_column(&self) -> u32 {
        self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_addresses_one_based() {
        let doc = GridDocument::from_rows(vec![vec!["Food Name", "Calories"], vec!["pear", ""]]);
        assert_eq!(doc.value(1, 1).as_deref(), Some("Food Name"));
        assert_eq!(doc.value(2, 1).as_deref(), Some("pear"));
        assert_eq!(doc.value(2, 2), None);
        assert_eq!(doc.highest_row(), 2);
        assert_eq!(doc.highest_column(), 2);
    }

    #[test]
    fn test_cleared_cell_reads_as_empty_but_is_recorded() {
        let mut doc = GridDocument::new();
        doc.set(3, 23, CellValue::Empty);
        assert_eq!(doc.value(3, 23), None);
        assert_eq!(doc.cell(3, 23), Some(&CellValue::Empty));
        assert_eq!(doc.cell(3, 24), None);
    }

    #[test]
    fn test_numbers_render_like_a_spreadsheet() {
        assert_eq!(format_number(120.0), "120");
        assert_eq!(format_number(12.5), "12.5");
    }
}
