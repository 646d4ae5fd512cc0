//! Name resolution against the catalog
//!
//! Generation is only reachable once every name resolves; any miss halts the
//! pipeline with the list of names that still need catalog entries.

use crate::catalog::CatalogStore;
use buffet_common::{normalize_name, FoodItem, Result};
use std::collections::HashMap;
use tracing::debug;

/// Outcome of resolving a name list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Names absent from the catalog, deduplicated, in first-seen order
    Missing(Vec<String>),
    /// One item per input name, in input order, repeats included
    Resolved(Vec<FoodItem>),
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Normalize raw names, dropping blanks
pub fn normalize_names<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter()
        .map(|s| normalize_name(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split multi-line text input (one name per line) and normalize
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(normalize_name)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolve a raw name list
///
/// Each distinct normalized name is looked up once.
pub async fn resolve<C, S>(store: &C, raw: &[S]) -> Result<Resolution>
where
    C: CatalogStore + ?Sized,
    S: AsRef<str>,
{
    let names = normalize_names(raw);

    let mut found: HashMap<String, FoodItem> = HashMap::new();
    let mut missing: Vec<String> = Vec::new();

    for name in &names {
        if found.contains_key(name) || missing.contains(name) {
            continue;
        }
        match store.get(name).await? {
            Some(item) => {
                found.insert(name.clone(), item);
            }
            None => missing.push(name.clone()),
        }
    }

    if !missing.is_empty() {
        debug!(missing = missing.len(), total = names.len(), "Resolution incomplete");
        return Ok(Resolution::Missing(missing));
    }

    let items = names
        .iter()
        .filter_map(|name| found.get(name).cloned())
        .collect();
    Ok(Resolution::Resolved(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use buffet_common::db::init_database;
    use buffet_common::AllergenSet;

    async fn catalog_with(items: &[FoodItem]) -> (tempfile::TempDir, SqliteCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_database(&dir.path().join("buffet.db")).await.unwrap();
        let catalog = SqliteCatalog::new(pool);
        for item in items {
            catalog.insert(item).await.unwrap();
        }
        (dir, catalog)
    }

    fn banana() -> FoodItem {
        FoodItem::new("BANANA", 100, AllergenSet::parse_input("Milk").unwrap())
    }

    #[test]
    fn test_split_lines_drops_blanks() {
        assert_eq!(
            split_lines("apple\n\n  banana \r\n\t\n"),
            vec!["APPLE".to_string(), "BANANA".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_names_first_seen_order() {
        let (_dir, catalog) = catalog_with(&[banana()]).await;

        let resolution = resolve(&catalog, &["Apple", "BANANA ", "kiwi", "apple", ""])
            .await
            .unwrap();

        assert_eq!(
            resolution,
            Resolution::Missing(vec!["APPLE".to_string(), "KIWI".to_string()])
        );
    }

    #[tokio::test]
    async fn test_single_missing_example() {
        let (_dir, catalog) = catalog_with(&[banana()]).await;

        let resolution = resolve(&catalog, &["Apple", "BANANA "]).await.unwrap();

        assert_eq!(resolution, Resolution::Missing(vec!["APPLE".to_string()]));
        assert!(!resolution.is_complete());
    }

    #[tokio::test]
    async fn test_resolved_keeps_order_and_repeats() {
        let pear = FoodItem::new("PEAR", 40, AllergenSet::new());
        let (_dir, catalog) = catalog_with(&[banana(), pear.clone()]).await;

        let resolution = resolve(&catalog, &["pear", "banana", "PEAR"]).await.unwrap();

        assert_eq!(
            resolution,
            Resolution::Resolved(vec![pear.clone(), banana(), pear])
        );
    }

    #[tokio::test]
    async fn test_empty_list_resolves_to_nothing() {
        let (_dir, catalog) = catalog_with(&[]).await;
        let empty: [&str; 0] = [];

        let resolution = resolve(&catalog, &empty).await.unwrap();

        assert_eq!(resolution, Resolution::Resolved(Vec::new()));
    }
}
