//! Common error types for buffet tags

use thiserror::Error;

/// Common result type for buffet tag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the buffet tag crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found (unknown or expired session, missing template)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Catalog entry already exists and was left untouched
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Spreadsheet could not be read or written
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
