//! # Buffet Tags Common Library
//!
//! Shared code for the buffet tag tooling including:
//! - Allergen vocabulary and allergen sets
//! - Food item model and name normalization
//! - Database initialization and migrations
//! - Configuration loading
//! - Common error types

pub mod allergen;
pub mod config;
pub mod db;
pub mod error;
pub mod food;

pub use allergen::{Allergen, AllergenSet};
pub use error::{Error, Result};
pub use food::{normalize_name, FoodItem};
