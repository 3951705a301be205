//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The on-disk document could not be parsed.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store lock.
    #[error("storage is locked by another process: {}", path.display())]
    Locked {
        /// Path of the locked store directory.
        path: PathBuf,
    },

    /// The storage is closed.
    #[error("storage is closed")]
    Closed,
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Corrupted(err.to_string())
    }
}
