//! Food item model

use crate::allergen::AllergenSet;
use serde::{Deserialize, Serialize};

/// Catalog record for one food
///
/// `name` is always stored normalized (see [`normalize_name`]) and is the
/// unique key of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub calories: u32,
    pub allergens: AllergenSet,
}

impl FoodItem {
    /// Create a food item, normalizing the name
    pub fn new(name: &str, calories: u32, allergens: AllergenSet) -> Self {
        Self {
            name: normalize_name(name),
            calories,
            allergens,
        }
    }
}

/// Trim and uppercase a raw food name
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}
