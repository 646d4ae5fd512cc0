//! Catalog store
//!
//! Keyed lookup and insert of food records. Entries are never updated or
//! deleted through this interface; a second insert under an existing name
//! is reported as [`InsertOutcome::AlreadyExists`] and leaves the stored row
//! untouched.

use async_trait::async_trait;
use buffet_common::{normalize_name, AllergenSet, FoodItem, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Result of an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same normalized name exists; nothing was written
    AlreadyExists,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up a food by name (normalized before the lookup)
    async fn get(&self, name: &str) -> Result<Option<FoodItem>>;

    /// Insert a new food; never overwrites
    async fn insert(&self, item: &FoodItem) -> Result<InsertOutcome>;
}

/// SQLite-backed catalog over the `food_items` table
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of catalog rows
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM food_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn get(&self, name: &str) -> Result<Option<FoodItem>> {
        let name = normalize_name(name);

        let row = sqlx::query_as::<_, (String, Option<i64>, Option<String>)>(
            "SELECT name, calories, allergens FROM food_items WHERE name = ?",
        )
        .bind(&name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(name, calories, allergens)| FoodItem {
            name,
            // Legacy rows may hold NULL or out-of-range calories
            calories: calories
                .and_then(|c| u32::try_from(c).ok())
                .unwrap_or(0),
            allergens: allergens
                .as_deref()
                .map(AllergenSet::from_stored)
                .unwrap_or_default(),
        }))
    }

    async fn insert(&self, item: &FoodItem) -> Result<InsertOutcome> {
        let name = normalize_name(&item.name);

        let result = sqlx::query(
            r#"
            INSERT INTO food_items (name, calories, allergens)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(&name)
        .bind(i64::from(item.calories))
        .bind(item.allergens.to_stored())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(name = %name, "Catalog insert skipped, name already present");
            Ok(InsertOutcome::AlreadyExists)
        } else {
            info!(
                name = %name,
                calories = item.calories,
                allergens = %item.allergens,
                "Added food to catalog"
            );
            Ok(InsertOutcome::Inserted)
        }
    }
}
