//! Error types for QuoteSync core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in quote store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required field was empty.
    #[error("validation failed: {field} {message}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// No quote with the given id exists.
    #[error("quote not found: {0}")]
    QuoteNotFound(String),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] quotesync_storage::StorageError),

    /// Persisted or imported JSON could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl CoreError {
    /// Creates a validation error for an empty required field.
    pub fn empty_field(field: &'static str) -> Self {
        Self::Validation {
            field,
            message: "must not be empty".into(),
        }
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation { .. })
    }
}
