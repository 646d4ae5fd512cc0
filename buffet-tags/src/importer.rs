//! Bulk importer
//!
//! Turns a tabular upload into catalog-ready entries. Columns are located by
//! header text through an ordered alias table; allergen tokens are passed
//! through unvalidated and the catalog service decides what to keep.

use crate::document::CellDocument;
use buffet_common::normalize_name;
use serde::Serialize;
use tracing::{debug, warn};

/// Header row of an import sheet
pub const HEADER_ROW: u32 = 1;

/// Cell text a dataframe export writes for an empty value
pub const SENTINEL: &str = "nan";

/// Canonical import fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportField {
    Name,
    Calories,
    Allergens,
}

/// Field → accepted header substrings (lowercase), evaluated in order
pub const HEADER_ALIASES: [(ImportField, &[&str]); 3] = [
    (ImportField::Name, &["name"]),
    (ImportField::Calories, &["calor"]),
    (ImportField::Allergens, &["allerg"]),
];

/// Resolved 1-based column positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: u32,
    pub calories: u32,
    pub allergens: Option<u32>,
}

/// One parsed row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEntry {
    pub name: String,
    pub calories: u32,
    /// Raw trimmed tokens, not yet checked against the vocabulary
    pub allergens: Vec<String>,
}

pub fn is_sentinel(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(SENTINEL)
}

fn find_column<D: CellDocument + ?Sized>(doc: &D, aliases: &[&str]) -> Option<u32> {
    (1..=doc.highest_column()).find(|&col| {
        doc.value(HEADER_ROW, col)
            .map(|header| {
                let header = header.to_lowercase();
                aliases.iter().any(|alias| header.contains(alias))
            })
            .unwrap_or(false)
    })
}

/// Locate the import columns from the header row
///
/// `None` when either the name or the calorie column is absent.
pub fn resolve_columns<D: CellDocument + ?Sized>(doc: &D) -> Option<ColumnMap> {
    let mut name = None;
    let mut calories = None;
    let mut allergens = None;

    for (field, aliases) in HEADER_ALIASES.iter() {
        let col = find_column(doc, aliases);
        match field {
            ImportField::Name => name = col,
            ImportField::Calories => calories = col,
            ImportField::Allergens => allergens = col,
        }
    }

    Some(ColumnMap {
        name: name?,
        calories: calories?,
        allergens,
    })
}

/// Lenient calorie cell parse: whole numbers as-is, decimals truncated,
/// anything else (blank, negative, text) is zero
pub fn parse_calorie_cell(text: Option<&str>) -> u32 {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return 0;
    };

    if let Ok(n) = text.parse::<u32>() {
        return n;
    }

    match text.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX) => f.trunc() as u32,
        _ => 0,
    }
}

fn split_tokens(text: Option<&str>) -> Vec<String> {
    match text {
        Some(t) if !is_sentinel(t) => t
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse every data row of the document
///
/// Returns an empty list when the header row lacks a name or calorie column.
pub fn parse_table<D: CellDocument + ?Sized>(doc: &D) -> Vec<ImportEntry> {
    let Some(columns) = resolve_columns(doc) else {
        warn!("Import sheet has no name or calorie column; nothing imported");
        return Vec::new();
    };
    debug!(?columns, "Resolved import columns");

    let mut entries = Vec::new();
    for row in (HEADER_ROW + 1)..=doc.highest_row() {
        let name = match doc.value(row, columns.name) {
            Some(raw) if !is_sentinel(&raw) => normalize_name(&raw),
            _ => continue,
        };
        if name.is_empty() {
            continue;
        }

        let calories = parse_calorie_cell(doc.value(row, columns.calories).as_deref());
        let allergens = columns
            .allergens
            .map(|col| split_tokens(doc.value(row, col).as_deref()))
            .unwrap_or_default();

        entries.push(ImportEntry {
            name,
            calories,
            allergens,
        });
    }

    entries
}
