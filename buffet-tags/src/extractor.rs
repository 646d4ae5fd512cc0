//! Name extractor
//!
//! Reads the food-name column of a filled tag sheet so it can be fed back to
//! the resolver.

use crate::document::CellDocument;
use crate::importer::is_sentinel;

pub const NAME_COLUMN: u32 = 4;
pub const FIRST_ROW: u32 = 2;
pub const LAST_ROW: u32 = 60;

/// Non-empty, non-sentinel names in row order, trimmed
pub fn extract_names<D: CellDocument + ?Sized>(doc: &D) -> Vec<String> {
    (FIRST_ROW..=LAST_ROW)
        .filter_map(|row| doc.value(row, NAME_COLUMN))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty() && !is_sentinel(text))
        .collect()
}
