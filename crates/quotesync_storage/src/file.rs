//! File-based storage backend for persistent storage.
//!
//! Layout of a store directory:
//!
//! ```text
//! <store_path>/
//! ├─ LOCK              # Advisory lock for single-writer
//! ├─ store.json        # All keys as one JSON object
//! └─ store.json.tmp    # Scratch file for atomic rewrites
//! ```

use crate::backend::KeyValueBackend;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const DATA_FILE: &str = "store.json";
const DATA_TEMP: &str = "store.json.tmp";

/// A file-based key-value backend.
///
/// Entries are cached in memory and every write rewrites the whole document
/// using write-then-rename, so a crash never leaves a half-written store.
///
/// # Thread Safety
///
/// The backend holds an exclusive advisory lock on its directory for as
/// long as it is open. Only one `FileBackend` can exist per directory.
///
/// # Example
///
/// ```no_run
/// use quotesync_storage::{KeyValueBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("quotes_data")).unwrap();
/// backend.set("quotes", "[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
    _lock_file: File,
}

impl FileBackend {
    /// Opens or creates a store directory at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - Another process holds the lock (returns `Locked`)
    /// - The existing document is not a JSON object of strings
    pub fn open(path: &Path) -> StorageResult<Self> {
        fs::create_dir_all(path)?;

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked {
                path: path.to_path_buf(),
            });
        }

        let entries = Self::read_document(&path.join(DATA_FILE))?;
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");

        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of the JSON document.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.path.join(DATA_FILE)
    }

    fn read_document(data_path: &Path) -> StorageResult<BTreeMap<String, String>> {
        if !data_path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(data_path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    /// Writes `entries` to disk atomically.
    fn write_document(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let temp_path = self.path.join(DATA_TEMP);
        let data = serde_json::to_vec(entries)?;

        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.data_path())?;
        Ok(())
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.write();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.write_document(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.write_document(&next)?;
        *entries = next;
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn flush(&mut self) -> StorageResult<()> {
        // Every write is already synced before the rename
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store");

        let backend = FileBackend::open(&path).unwrap();
        assert!(backend.keys().unwrap().is_empty());
        assert!(path.join(LOCK_FILE).exists());
    }

    #[test]
    fn file_set_and_get() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(dir.path()).unwrap();

        backend.set("quotes", "[]").unwrap();
        backend.set("lastSelectedCategory", "\"all\"").unwrap();

        assert_eq!(backend.get("quotes").unwrap().as_deref(), Some("[]"));
        assert_eq!(
            backend.keys().unwrap(),
            vec!["lastSelectedCategory", "quotes"]
        );
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();

        {
            let mut backend = FileBackend::open(dir.path()).unwrap();
            backend.set("quotes", "[{\"id\":\"a\"}]").unwrap();
        }

        {
            let backend = FileBackend::open(dir.path()).unwrap();
            assert_eq!(
                backend.get("quotes").unwrap().as_deref(),
                Some("[{\"id\":\"a\"}]")
            );
        }
    }

    #[test]
    fn file_remove_persists() {
        let dir = tempdir().unwrap();

        {
            let mut backend = FileBackend::open(dir.path()).unwrap();
            backend.set("a", "1").unwrap();
            backend.set("b", "2").unwrap();
            backend.remove("a").unwrap();
            backend.remove("missing").unwrap();
        }

        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["b"]);
    }

    #[test]
    fn file_second_open_is_locked() {
        let dir = tempdir().unwrap();

        let first = FileBackend::open(dir.path()).unwrap();
        let second = FileBackend::open(dir.path());
        assert!(matches!(second, Err(StorageError::Locked { .. })));

        drop(first);
        assert!(FileBackend::open(dir.path()).is_ok());
    }

    #[test]
    fn file_corrupted_document_is_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DATA_FILE), "not json").unwrap();

        let result = FileBackend::open(dir.path());
        assert!(matches!(result, Err(StorageError::Corrupted(_))));
    }

    #[test]
    fn file_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(dir.path()).unwrap();
        backend.set("k", "v").unwrap();

        assert!(!dir.path().join(DATA_TEMP).exists());
        assert!(backend.data_path().exists());
    }
}
