//! The quote store.

use crate::category::{CategoryFilter, CategoryIndex};
use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::quote::{Quote, QuoteId};
use crate::transfer::QuoteRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use quotesync_storage::KeyValueBackend;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// In-memory quote list mirrored to a key-value backend.
///
/// The store is the sole owner of quote lifetime. Every mutation is written
/// to the backend first and only then becomes visible, so a failed write
/// leaves the last good state in place.
pub struct QuoteStore {
    backend: Box<dyn KeyValueBackend>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    quotes: Vec<Quote>,
    categories: CategoryIndex,
    active_filter: CategoryFilter,
    pending_sync: Vec<Quote>,
    last_sync_time: Option<DateTime<Utc>>,
    filter_dirty: bool,
}

/// In-memory store state saved by [`QuoteStore::checkpoint`].
#[derive(Debug, Clone)]
pub struct StoreCheckpoint {
    quotes: Vec<Quote>,
    active_filter: CategoryFilter,
    filter_dirty: bool,
}

impl fmt::Debug for QuoteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteStore")
            .field("quotes", &self.quotes.len())
            .field("categories", &self.categories.len())
            .field("active_filter", &self.active_filter)
            .field("pending_sync", &self.pending_sync.len())
            .field("last_sync_time", &self.last_sync_time)
            .finish_non_exhaustive()
    }
}

impl QuoteStore {
    /// Opens a store on `backend` using the system clock and loads it.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state cannot be read or the seed
    /// cannot be written.
    pub fn open(backend: impl KeyValueBackend + 'static, config: StoreConfig) -> CoreResult<Self> {
        Self::open_with_clock(backend, config, Arc::new(SystemClock))
    }

    /// Opens a store with an explicit clock and loads it.
    ///
    /// # Errors
    ///
    /// See [`QuoteStore::open`].
    pub fn open_with_clock(
        backend: impl KeyValueBackend + 'static,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> CoreResult<Self> {
        let mut store = Self {
            backend: Box::new(backend),
            config,
            clock,
            quotes: Vec::new(),
            categories: CategoryIndex::default(),
            active_filter: CategoryFilter::All,
            pending_sync: Vec::new(),
            last_sync_time: None,
            filter_dirty: false,
        };
        store.load()?;
        Ok(store)
    }

    /// Reads persisted state, seeding and persisting the defaults when no
    /// quote list has been stored yet.
    ///
    /// Loading twice is idempotent: the second load reads back the seed the
    /// first one wrote.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state cannot be parsed or a write fails.
    pub fn load(&mut self) -> CoreResult<()> {
        let keys = self.config.keys.clone();
        let now = self.clock.now_millis();

        let (quotes, rewrite) = match self.backend.get(&keys.quotes)? {
            Some(raw) => {
                let records: Vec<QuoteRecord> = serde_json::from_str(&raw)?;
                self.normalize(records, now)
            }
            None => {
                let seeded: Vec<Quote> = self
                    .config
                    .seed
                    .iter()
                    .map(|s| Quote::new(QuoteId::generate(), &s.text, &s.author, &s.category, now))
                    .collect();
                tracing::info!(count = seeded.len(), "seeding empty quote store");
                (seeded, true)
            }
        };

        if rewrite {
            self.write_quotes(&quotes)?;
        }
        self.quotes = quotes;
        self.categories = CategoryIndex::from_quotes(&self.quotes);

        self.pending_sync = match self.backend.get(&keys.pending_sync)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        self.last_sync_time = match self.read_text(&keys.last_sync_time)? {
            Some(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    tracing::warn!(value = %text, error = %e, "ignoring unreadable last sync time");
                })
                .ok(),
            None => None,
        };

        let stored = self
            .read_text(&keys.selected_category)?
            .map(|name| CategoryFilter::parse(&name));
        let restored = self
            .categories
            .validate(stored.clone().unwrap_or(CategoryFilter::All));
        self.active_filter = restored.clone();
        if stored.is_some_and(|s| s != restored) {
            tracing::debug!("stored category filter is stale, resetting to all");
            self.write_filter()?;
        }

        tracing::debug!(
            quotes = self.quotes.len(),
            pending = self.pending_sync.len(),
            filter = self.active_filter.as_str(),
            "loaded quote store"
        );
        Ok(())
    }

    /// Writes the full quote list to the backend.
    ///
    /// The active filter is written too if an in-memory snapshot reset it.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub fn persist(&mut self) -> CoreResult<()> {
        let json = serde_json::to_string(&self.quotes)?;
        self.backend.set(&self.config.keys.quotes, &json)?;
        if self.filter_dirty {
            self.write_filter()?;
        }
        Ok(())
    }

    /// Adds a new local quote.
    ///
    /// Text and author are trimmed and must be non-empty. An empty category
    /// becomes the configured default category.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty text or author, or a storage error.
    /// Neither changes the store.
    pub fn add(&mut self, text: &str, author: &str, category: &str) -> CoreResult<Quote> {
        let (text, author, category) = self.validate_fields(text, author, category)?;
        let quote = Quote::new(
            QuoteId::generate(),
            text,
            author,
            category,
            self.clock.now_millis(),
        );

        let mut next = self.quotes.clone();
        next.push(quote.clone());
        self.commit(next)?;

        tracing::debug!(id = %quote.id, category = %quote.category, "added quote");
        Ok(quote)
    }

    /// Replaces the content of an existing quote.
    ///
    /// The timestamp moves to the current time, or one past the previous
    /// timestamp if the clock has not advanced.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for empty fields, `QuoteNotFound` for an
    /// unknown id, or a storage error.
    pub fn update(
        &mut self,
        id: &QuoteId,
        text: &str,
        author: &str,
        category: &str,
    ) -> CoreResult<Quote> {
        let (text, author, category) = self.validate_fields(text, author, category)?;
        let index = self
            .position(id)
            .ok_or_else(|| CoreError::QuoteNotFound(id.to_string()))?;

        let now = self.clock.now_millis();
        let mut next = self.quotes.clone();
        let quote = &mut next[index];
        quote.text = text;
        quote.author = author;
        quote.category = category;
        quote.timestamp = now.max(quote.timestamp.saturating_add(1));
        let updated = quote.clone();

        self.commit(next)?;
        tracing::debug!(id = %updated.id, "updated quote");
        Ok(updated)
    }

    /// Removes the quote with `id`.
    ///
    /// Returns `false` without touching storage if no such quote exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn delete(&mut self, id: &QuoteId) -> CoreResult<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let mut next = self.quotes.clone();
        next.remove(index);
        self.commit(next)?;

        tracing::debug!(id = %id, "deleted quote");
        Ok(true)
    }

    /// Replaces the whole quote list, as a sync commit does.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the previous list is kept.
    pub fn replace_all(&mut self, quotes: Vec<Quote>) -> CoreResult<()> {
        debug_assert!(
            {
                let mut seen = HashSet::new();
                quotes.iter().all(|q| seen.insert(q.id.clone()))
            },
            "replacement list has duplicate ids"
        );
        self.commit(quotes)
    }

    /// Overwrites the record with the snapshot's id in memory only.
    ///
    /// Used by conflict resolution, which persists once when it is done.
    /// Returns `false` if the store holds no record with that id.
    pub fn apply_snapshot(&mut self, snapshot: Quote) -> bool {
        let Some(index) = self.position(&snapshot.id) else {
            return false;
        };
        self.quotes[index] = snapshot;
        self.categories = CategoryIndex::from_quotes(&self.quotes);

        let validated = self.categories.validate(self.active_filter.clone());
        if validated != self.active_filter {
            self.active_filter = validated;
            self.filter_dirty = true;
        }
        true
    }

    /// Captures the in-memory quote list and filter.
    ///
    /// Pair with [`QuoteStore::rollback`] to undo snapshots applied with
    /// [`QuoteStore::apply_snapshot`] when the following persist fails.
    pub fn checkpoint(&self) -> StoreCheckpoint {
        StoreCheckpoint {
            quotes: self.quotes.clone(),
            active_filter: self.active_filter.clone(),
            filter_dirty: self.filter_dirty,
        }
    }

    /// Restores in-memory state captured by [`QuoteStore::checkpoint`].
    ///
    /// Nothing is written.
    pub fn rollback(&mut self, checkpoint: StoreCheckpoint) {
        self.quotes = checkpoint.quotes;
        self.categories = CategoryIndex::from_quotes(&self.quotes);
        self.active_filter = checkpoint.active_filter;
        self.filter_dirty = checkpoint.filter_dirty;
    }

    /// Returns the quote with `id`.
    pub fn get(&self, id: &QuoteId) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.id == *id)
    }

    /// Returns true if a quote with `id` exists.
    pub fn contains(&self, id: &QuoteId) -> bool {
        self.position(id).is_some()
    }

    /// All quotes in insertion/merge order.
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Number of quotes.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Returns true if the store holds no quotes.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// The derived category index.
    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    /// The active category filter.
    pub fn active_filter(&self) -> &CategoryFilter {
        &self.active_filter
    }

    /// Selects a category filter and persists the choice.
    ///
    /// A name that matches no category selects `all`. Returns the filter
    /// actually applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn select_category(&mut self, name: &str) -> CoreResult<CategoryFilter> {
        let filter = self.categories.validate(CategoryFilter::parse(name));
        self.active_filter = filter.clone();
        self.write_filter()?;
        Ok(filter)
    }

    /// Quotes passing the active filter.
    pub fn filtered(&self) -> Vec<&Quote> {
        self.quotes
            .iter()
            .filter(|q| self.active_filter.matches(q))
            .collect()
    }

    /// A uniformly random quote from the active filter.
    pub fn random_quote<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Quote> {
        self.filtered().choose(rng).copied()
    }

    /// Quotes waiting to be pushed after a failed push.
    pub fn pending_sync(&self) -> &[Quote] {
        &self.pending_sync
    }

    /// Replaces the retry queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the previous queue is kept.
    pub fn set_pending_sync(&mut self, quotes: Vec<Quote>) -> CoreResult<()> {
        let key = self.config.keys.pending_sync.clone();
        if quotes.is_empty() {
            self.backend.remove(&key)?;
        } else {
            let json = serde_json::to_string(&quotes)?;
            self.backend.set(&key, &json)?;
        }
        self.pending_sync = quotes;
        Ok(())
    }

    /// Time of the last successful sync commit.
    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.last_sync_time
    }

    /// Records a successful sync commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn record_sync_time(&mut self, at: DateTime<Utc>) -> CoreResult<()> {
        let key = self.config.keys.last_sync_time.clone();
        let json = serde_json::to_string(&at.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        self.backend.set(&key, &json)?;
        self.last_sync_time = Some(at);
        Ok(())
    }

    /// Current time from the store's clock, epoch milliseconds.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// The store's clock.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// The store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn commit(&mut self, quotes: Vec<Quote>) -> CoreResult<()> {
        self.write_quotes(&quotes)?;
        self.quotes = quotes;
        self.categories = CategoryIndex::from_quotes(&self.quotes);

        let validated = self.categories.validate(self.active_filter.clone());
        if validated != self.active_filter {
            tracing::debug!(
                stale = self.active_filter.as_str(),
                "active category vanished, resetting to all"
            );
            self.active_filter = validated;
            self.write_filter()?;
        }
        Ok(())
    }

    pub(crate) fn default_category(&self) -> &str {
        &self.config.default_category
    }

    fn position(&self, id: &QuoteId) -> Option<usize> {
        self.quotes.iter().position(|q| q.id == *id)
    }

    fn validate_fields(
        &self,
        text: &str,
        author: &str,
        category: &str,
    ) -> CoreResult<(String, String, String)> {
        let text = text.trim();
        let author = author.trim();
        let category = category.trim();

        if text.is_empty() {
            return Err(CoreError::empty_field("text"));
        }
        if author.is_empty() {
            return Err(CoreError::empty_field("author"));
        }
        let category = if category.is_empty() {
            self.config.default_category.clone()
        } else {
            category.to_string()
        };
        Ok((text.to_string(), author.to_string(), category))
    }

    /// Turns persisted records into quotes, dropping invalid and duplicate
    /// entries. The flag says whether anything had to be repaired.
    fn normalize(&self, records: Vec<QuoteRecord>, now: i64) -> (Vec<Quote>, bool) {
        let mut seen = HashSet::new();
        let mut quotes = Vec::with_capacity(records.len());
        let mut repaired = false;

        for record in records {
            repaired |= record.id.is_none() || record.timestamp.is_none();
            match record.into_quote(now, &self.config.default_category) {
                Some(quote) if seen.insert(quote.id.clone()) => quotes.push(quote),
                Some(quote) => {
                    tracing::warn!(id = %quote.id, "dropping duplicate persisted quote");
                    repaired = true;
                }
                None => {
                    tracing::warn!("dropping persisted quote with empty text or author");
                    repaired = true;
                }
            }
        }
        (quotes, repaired)
    }

    fn write_quotes(&mut self, quotes: &[Quote]) -> CoreResult<()> {
        let json = serde_json::to_string(quotes)?;
        self.backend.set(&self.config.keys.quotes, &json)?;
        Ok(())
    }

    fn write_filter(&mut self) -> CoreResult<()> {
        let json = serde_json::to_string(&self.active_filter)?;
        self.backend
            .set(&self.config.keys.selected_category, &json)?;
        self.filter_dirty = false;
        Ok(())
    }

    /// Reads a string value stored either as JSON or as bare text.
    fn read_text(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self
            .backend
            .get(key)?
            .map(|raw| serde_json::from_str::<String>(&raw).unwrap_or(raw)))
    }
}
