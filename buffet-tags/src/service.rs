//! Catalog service operations
//!
//! Thin layer over [`CatalogStore`] that front ends call: single adds with
//! conflict reporting, bulk imports with an added/skipped/rejected split,
//! and detail lookup for ad-hoc generation.

use crate::catalog::{CatalogStore, InsertOutcome};
use crate::importer::ImportEntry;
use buffet_common::{normalize_name, AllergenSet, Error, FoodItem, Result};
use serde::Serialize;
use tracing::{info, warn};

/// Insert one food
///
/// A name that already exists is reported as [`Error::Conflict`] and the
/// stored record is left as it was.
pub async fn add_item<C: CatalogStore + ?Sized>(
    store: &C,
    name: &str,
    calories: u32,
    allergens: AllergenSet,
) -> Result<FoodItem> {
    let item = FoodItem::new(name, calories, allergens);
    if item.name.is_empty() {
        return Err(Error::InvalidInput("Food name must not be blank".to_string()));
    }

    match store.insert(&item).await? {
        InsertOutcome::Inserted => Ok(item),
        InsertOutcome::AlreadyExists => Err(Error::Conflict(format!(
            "{} already exists in the catalog",
            item.name
        ))),
    }
}

/// Entry refused by a bulk import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedEntry {
    pub name: String,
    pub invalid: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkImportReport {
    pub added: Vec<String>,
    /// Already present, left untouched
    pub skipped: Vec<String>,
    /// Allergen tokens outside the vocabulary
    pub rejected: Vec<RejectedEntry>,
}

/// Insert parsed import rows, validating allergen tokens first
pub async fn import_entries<C: CatalogStore + ?Sized>(
    store: &C,
    entries: &[ImportEntry],
) -> Result<BulkImportReport> {
    let mut report = BulkImportReport::default();

    for entry in entries {
        let allergens = match AllergenSet::from_tokens(&entry.allergens) {
            Ok(set) => set,
            Err(invalid) => {
                warn!(name = %entry.name, ?invalid, "Import row rejected: unknown allergens");
                report.rejected.push(RejectedEntry {
                    name: entry.name.clone(),
                    invalid,
                });
                continue;
            }
        };

        let item = FoodItem::new(&entry.name, entry.calories, allergens);
        match store.insert(&item).await? {
            InsertOutcome::Inserted => report.added.push(item.name),
            InsertOutcome::AlreadyExists => report.skipped.push(item.name),
        }
    }

    info!(
        added = report.added.len(),
        skipped = report.skipped.len(),
        rejected = report.rejected.len(),
        "Bulk import finished"
    );
    Ok(report)
}

/// Look up each name in order
///
/// Names absent from the catalog come back with zero calories and no
/// allergens rather than failing the lookup.
pub async fn get_details<C, S>(store: &C, names: &[S]) -> Result<Vec<FoodItem>>
where
    C: CatalogStore + ?Sized,
    S: AsRef<str>,
{
    let mut details = Vec::with_capacity(names.len());
    for raw in names {
        let name = normalize_name(raw.as_ref());
        if name.is_empty() {
            continue;
        }
        let item = match store.get(&name).await? {
            Some(item) => item,
            None => FoodItem::new(&name, 0, AllergenSet::new()),
        };
        details.push(item);
    }
    Ok(details)
}
