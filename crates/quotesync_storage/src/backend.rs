//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level key-value backend for QuoteSync.
///
/// Backends are **opaque string stores**, the browser-storage analogue of
/// `localStorage`. The quote store owns all value interpretation.
///
/// # Invariants
///
/// - `get` returns exactly the value most recently passed to `set` for a key
/// - `set` either fully replaces the value or leaves the old one in place
/// - `remove` of a missing key is a no-op
/// - Backends must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait KeyValueBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `None` if the key has never been written or was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. On error the previous value
    /// remains readable.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// Returns all keys currently stored, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Flushes pending writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns true if `key` holds a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
