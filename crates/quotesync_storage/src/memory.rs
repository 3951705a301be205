//! In-memory storage backend for testing.

use crate::backend::KeyValueBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Shared {
    entries: RwLock<BTreeMap<String, String>>,
    writes: AtomicU64,
    fail_writes: AtomicBool,
}

/// An in-memory key-value backend.
///
/// This backend keeps all entries in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// Clones share the same entries, so a test can hand one clone to a store
/// and keep another to inspect what was written or to inject write failures.
///
/// # Example
///
/// ```rust
/// use quotesync_storage::{KeyValueBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// let observer = backend.clone();
/// backend.set("lastSyncTime", "\"2024-01-01T00:00:00Z\"").unwrap();
/// assert_eq!(observer.write_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    shared: Arc<Shared>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with entries.
    ///
    /// Useful for testing load and migration scenarios.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(map),
                ..Shared::default()
            }),
        }
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.shared.entries.read().clone()
    }

    /// Returns how many successful `set` calls this backend has seen.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.shared.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write fail with an I/O error until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Clears all entries.
    pub fn clear(&mut self) {
        self.shared.entries.write().clear();
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Other,
                "injected write failure",
            )));
        }
        Ok(())
    }
}

impl KeyValueBackend for InMemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.shared.entries.read().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;
        self.shared
            .entries
            .write()
            .insert(key.to_string(), value.to_string());
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.check_writable()?;
        self.shared.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.shared.entries.read().keys().cloned().collect())
    }

    fn flush(&mut self) -> StorageResult<()> {
        // Nothing buffered
        Ok(())
    }
}
