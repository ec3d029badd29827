//! Error types for the persistence layer.

use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened or initialized.
    #[error("failed to open license store: {0}")]
    Open(String),

    /// A query or statement failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
