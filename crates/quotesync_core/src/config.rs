//! Quote store configuration.

/// Storage keys the store reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Full quote list.
    pub quotes: String,
    /// Last active category filter.
    pub selected_category: String,
    /// RFC 3339 time of the last successful sync commit.
    pub last_sync_time: String,
    /// Quotes whose push failed, retried on the next cycle.
    pub pending_sync: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            quotes: "quotes".into(),
            selected_category: "lastSelectedCategory".into(),
            last_sync_time: "lastSyncTime".into(),
            pending_sync: "pendingSync".into(),
        }
    }
}

/// A quote used to seed an empty store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedQuote {
    /// Quote text.
    pub text: String,
    /// Quote author.
    pub author: String,
    /// Quote category.
    pub category: String,
}

impl SeedQuote {
    /// Creates a seed quote.
    pub fn new(
        text: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            category: category.into(),
        }
    }

    /// The built-in default set.
    pub fn defaults() -> Vec<SeedQuote> {
        vec![
            SeedQuote::new(
                "Success is not final, failure is not fatal.",
                "Winston Churchill",
                "Motivation",
            ),
            SeedQuote::new(
                "In the middle of difficulty lies opportunity.",
                "Albert Einstein",
                "Inspiration",
            ),
            SeedQuote::new(
                "Code is like humor. When you have to explain it, it's bad.",
                "Cory House",
                "Programming",
            ),
        ]
    }
}

/// Configuration for opening a quote store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Storage key names.
    pub keys: StorageKeys,
    /// Category given to quotes added without one.
    pub default_category: String,
    /// Quotes written on first load when nothing is persisted.
    pub seed: Vec<SeedQuote>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            default_category: "General".into(),
            seed: SeedQuote::defaults(),
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage key names.
    #[must_use]
    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Sets the category used when none is given.
    #[must_use]
    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = category.into();
        self
    }

    /// Replaces the seed set.
    #[must_use]
    pub fn with_seed(mut self, seed: Vec<SeedQuote>) -> Self {
        self.seed = seed;
        self
    }

    /// Starts empty stores with no quotes.
    #[must_use]
    pub fn without_seed(mut self) -> Self {
        self.seed.clear();
        self
    }
}
