//! Tag generator
//!
//! Fills a copy of the buffet tag template. The cell layout is fixed by the
//! template: one row per food starting at row 2, name in column D, calories
//! in column W and one marker column per allergen from X to AK. Every other
//! cell of the template is left exactly as it was.

use crate::document::{CellDocument, CellValue};
use crate::xlsx::XlsxDocument;
use buffet_common::{normalize_name, Allergen, AllergenSet, FoodItem, Result};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const NAME_COLUMN: u32 = 4;
pub const CALORIES_COLUMN: u32 = 23;
pub const FIRST_DATA_ROW: u32 = 2;
pub const MAX_TAGS: usize = 50;
pub const PRESENCE_MARKER: &str = "yes";

/// Allergen → marker column, in template order
pub const ALLERGEN_COLUMNS: [(Allergen, u32); 14] = [
    (Allergen::Crustaceans, 24),
    (Allergen::Molluscs, 25),
    (Allergen::Fish, 26),
    (Allergen::Soy, 27),
    (Allergen::Gluten, 28),
    (Allergen::Mustard, 29),
    (Allergen::Sesame, 30),
    (Allergen::Celery, 31),
    (Allergen::Eggs, 32),
    (Allergen::Milk, 33),
    (Allergen::Peanuts, 34),
    (Allergen::Nuts, 35),
    (Allergen::Sulphite, 36),
    (Allergen::Lupin, 37),
];

pub fn allergen_column(allergen: Allergen) -> Option<u32> {
    ALLERGEN_COLUMNS
        .iter()
        .find(|(a, _)| *a == allergen)
        .map(|(_, col)| *col)
}

/// Data printed on one tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagData {
    pub calories: u32,
    pub allergens: AllergenSet,
}

impl From<&FoodItem> for TagData {
    fn from(item: &FoodItem) -> Self {
        Self {
            calories: item.calories,
            allergens: item.allergens.clone(),
        }
    }
}

/// Caller-supplied data keyed by normalized name
pub type OverrideMap = HashMap<String, TagData>;

/// One row to fill; `data` is `None` when nothing is known for the name.
/// A blank name leaves its row untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    pub name: String,
    pub data: Option<TagData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub rows_written: usize,
    pub missing: BTreeSet<String>,
}

/// Write tag rows into the document
///
/// Rows past [`MAX_TAGS`] are dropped. Every filled row has its calorie and
/// allergen cells cleared; rows without data then get only their name and
/// are reported as missing.
pub fn fill_tags<D: CellDocument + ?Sized>(doc: &mut D, rows: &[TagRow]) -> FillReport {
    if rows.len() > MAX_TAGS {
        debug!(total = rows.len(), kept = MAX_TAGS, "Extra tag rows dropped");
    }

    let mut report = FillReport::default();
    for (offset, tag) in rows.iter().take(MAX_TAGS).enumerate() {
        if tag.name.is_empty() {
            continue;
        }

        let row = FIRST_DATA_ROW + offset as u32;
        doc.set(row, NAME_COLUMN, CellValue::Text(tag.name.clone()));
        doc.set(row, CALORIES_COLUMN, CellValue::Empty);
        for (_, col) in ALLERGEN_COLUMNS.iter() {
            doc.set(row, *col, CellValue::Empty);
        }
        report.rows_written += 1;

        let Some(data) = &tag.data else {
            report.missing.insert(tag.name.clone());
            continue;
        };

        doc.set(row, CALORIES_COLUMN, CellValue::Number(f64::from(data.calories)));
        for col in data.allergens.iter().filter_map(allergen_column) {
            doc.set(row, col, CellValue::Text(PRESENCE_MARKER.to_string()));
        }
    }

    report
}

/// Handle to a filled tag sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDocument {
    pub path: PathBuf,
    pub rows_written: usize,
    pub missing: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct TagGenerator {
    template_path: PathBuf,
    output_dir: PathBuf,
}

impl TagGenerator {
    pub fn new(template_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate tags for fully resolved items
    pub fn generate(&self, items: &[FoodItem]) -> Result<GeneratedDocument> {
        let rows: Vec<TagRow> = items
            .iter()
            .map(|item| TagRow {
                name: item.name.clone(),
                data: Some(TagData::from(item)),
            })
            .collect();
        self.render(&rows)
    }

    /// Generate tags from caller-supplied data, bypassing the catalog
    ///
    /// Blank names keep their position: the row is left as the template has it.
    pub fn generate_custom<S: AsRef<str>>(
        &self,
        names: &[S],
        overrides: &OverrideMap,
    ) -> Result<GeneratedDocument> {
        let rows: Vec<TagRow> = names
            .iter()
            .map(|raw| normalize_name(raw.as_ref()))
            .map(|name| TagRow {
                data: overrides.get(&name).cloned(),
                name,
            })
            .collect();
        self.render(&rows)
    }

    fn render(&self, rows: &[TagRow]) -> Result<GeneratedDocument> {
        if !self.template_path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Template not found: {}", self.template_path.display()),
            )
            .into());
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.next_output_path();
        std::fs::copy(&self.template_path, &path)?;

        let mut doc = XlsxDocument::open(&path)?;
        let report = fill_tags(&mut doc, rows);
        doc.save(&path)?;

        if !report.missing.is_empty() {
            debug!(missing = ?report.missing, "Rows written without data");
        }
        info!(
            path = %path.display(),
            rows = report.rows_written,
            missing = report.missing.len(),
            "Generated tag sheet"
        );

        Ok(GeneratedDocument {
            path,
            rows_written: report.rows_written,
            missing: report.missing,
        })
    }

    /// `Buffet_Tags_<timestamp>.xlsx`, suffixed when the second is taken
    fn next_output_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let base = format!("Buffet_Tags_{}", stamp);

        let mut candidate = self.output_dir.join(format!("{}.xlsx", base));
        let mut n = 1;
        while candidate.exists() {
            candidate = self.output_dir.join(format!("{}_{}.xlsx", base, n));
            n += 1;
        }
        candidate
    }
}
