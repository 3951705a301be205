//! Store fixtures and quote builders.

use quotesync_core::{ManualClock, Quote, QuoteId, QuoteSource, QuoteStore, StoreConfig};
use quotesync_storage::{FileBackend, InMemoryBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Default start time of fixture clocks, epoch milliseconds.
pub const FIXTURE_EPOCH: i64 = 1_700_000_000_000;

/// A quote store over an inspectable in-memory backend and a manual clock.
pub struct TestStore {
    /// The store.
    pub store: QuoteStore,
    /// A handle sharing the store's backend.
    pub backend: InMemoryBackend,
    /// The store's clock.
    pub clock: Arc<ManualClock>,
}

impl TestStore {
    /// An empty store with no seed.
    pub fn memory() -> Self {
        Self::with_config(StoreConfig::new().without_seed())
    }

    /// A store seeded with the built-in defaults.
    pub fn seeded() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// A store holding exactly `quotes`.
    pub fn with_quotes(quotes: Vec<Quote>) -> Self {
        let mut fixture = Self::memory();
        fixture
            .store
            .replace_all(quotes)
            .expect("Failed to replace fixture quotes");
        fixture
    }

    /// A store opened with `config`.
    pub fn with_config(config: StoreConfig) -> Self {
        let backend = InMemoryBackend::new();
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH));
        let store = QuoteStore::open_with_clock(backend.clone(), config, clock.clone())
            .expect("Failed to open in-memory store");
        Self {
            store,
            backend,
            clock,
        }
    }

    /// Reopens a fresh store over the same backend and clock.
    pub fn reopen(&self) -> QuoteStore {
        QuoteStore::open_with_clock(
            self.backend.clone(),
            self.store.config().clone(),
            self.clock.clone(),
        )
        .expect("Failed to reopen store")
    }
}

/// A file-backed store in a temporary directory.
pub struct TempFileStore {
    /// The store, if currently open.
    pub store: Option<QuoteStore>,
    dir: TempDir,
}

impl TempFileStore {
    /// Creates and opens a seeded store in a new temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let mut fixture = Self { store: None, dir };
        fixture.reopen();
        fixture
    }

    /// Directory holding the store files.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("quotes")
    }

    /// Closes the store, releasing its lock, and opens it again.
    pub fn reopen(&mut self) -> &mut QuoteStore {
        self.store = None;
        let backend = FileBackend::open(&self.path()).expect("Failed to open file backend");
        let store =
            QuoteStore::open(backend, StoreConfig::default()).expect("Failed to open file store");
        self.store.insert(store)
    }

    /// The open store.
    pub fn store(&mut self) -> &mut QuoteStore {
        if self.store.is_none() {
            self.reopen();
        }
        self.store.as_mut().expect("store was just opened")
    }
}

impl Default for TempFileStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `f` with a file-backed store in a temporary directory.
///
/// # Example
///
/// ```rust
/// use quotesync_testkit::with_temp_store;
///
/// with_temp_store(|store, _path| {
///     assert_eq!(store.len(), 3);
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&mut QuoteStore, &Path) -> R,
{
    let mut fixture = TempFileStore::new();
    let path = fixture.path();
    f(fixture.store(), &path)
}

/// Builder for hand-written quote records.
#[derive(Debug, Clone)]
pub struct QuoteBuilder {
    quote: Quote,
}

/// Starts a quote with the given id and placeholder content.
pub fn quote(id: &str) -> QuoteBuilder {
    QuoteBuilder {
        quote: Quote::new(QuoteId::new(id), "text", "author", "General", FIXTURE_EPOCH),
    }
}

impl QuoteBuilder {
    /// Sets the text.
    pub fn text(mut self, text: &str) -> Self {
        self.quote.text = text.to_string();
        self
    }

    /// Sets the author.
    pub fn author(mut self, author: &str) -> Self {
        self.quote.author = author.to_string();
        self
    }

    /// Sets the category.
    pub fn category(mut self, category: &str) -> Self {
        self.quote.category = category.to_string();
        self
    }

    /// Sets the timestamp.
    pub fn at(mut self, timestamp: i64) -> Self {
        self.quote.timestamp = timestamp;
        self
    }

    /// Marks the quote as a server copy synced at its timestamp.
    pub fn from_server(mut self) -> Self {
        self.quote.source = QuoteSource::Server;
        self.quote.last_synced = Some(self.quote.timestamp);
        self
    }

    /// Marks the quote as synced at its timestamp.
    pub fn synced(mut self) -> Self {
        self.quote.source = QuoteSource::Synced;
        self.quote.last_synced = Some(self.quote.timestamp);
        self
    }

    /// Finishes the quote.
    pub fn build(self) -> Quote {
        self.quote
    }
}

impl From<QuoteBuilder> for Quote {
    fn from(builder: QuoteBuilder) -> Self {
        builder.build()
    }
}
