//! Buffet tag generation
//!
//! Resolves food names against the catalog, collects data for names the
//! catalog lacks, lets the user review allergens, and fills the buffet tag
//! template.

pub mod catalog;
pub mod document;
pub mod extractor;
pub mod generator;
pub mod importer;
pub mod reconciler;
pub mod resolver;
pub mod service;
pub mod session;
pub mod upload;
pub mod validation;
pub mod xlsx;

pub use catalog::{CatalogStore, InsertOutcome, SqliteCatalog};
pub use generator::{GeneratedDocument, TagGenerator};
pub use reconciler::{Reconciler, Reply};
pub use resolver::{resolve, Resolution};
pub use session::{SessionStore, UserKey};
pub use validation::ValidationError;
