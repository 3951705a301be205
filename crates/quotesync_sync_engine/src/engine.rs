//! The sync engine.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::periodic::PeriodicSync;
use crate::resolver::ConflictResolver;
use crate::state::{SyncEvent, SyncState, SyncStats, SyncSummary};
use crate::transport::RemoteStub;
use parking_lot::{Mutex, RwLock};
use quotesync_core::{
    CategoryFilter, CoreResult, ImportSummary, Quote, QuoteId, QuoteStore,
};
use quotesync_sync_protocol::{merge, ConflictChoice, ConflictRecord, PushRequest};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

/// Reconciles a [`QuoteStore`] with a remote.
///
/// The engine owns the store for its lifetime. Edits go through the engine
/// so they can be rejected while a cycle is running; reads go through
/// [`SyncEngine::read`].
///
/// Cycles never overlap. A cycle requested while another is active fails
/// with [`SyncError::SyncInProgress`] and leaves the store untouched.
pub struct SyncEngine<R: RemoteStub> {
    config: SyncConfig,
    remote: Arc<R>,
    store: Mutex<QuoteStore>,
    resolver: Mutex<ConflictResolver>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    events: broadcast::Sender<SyncEvent>,
}

struct PushReport {
    pushed: usize,
    queued: usize,
}

impl<R: RemoteStub> SyncEngine<R> {
    /// Creates a new sync engine.
    pub fn new(config: SyncConfig, store: QuoteStore, remote: R) -> Self {
        Self::with_shared_remote(config, store, Arc::new(remote))
    }

    /// Creates a sync engine over a remote shared with the caller.
    pub fn with_shared_remote(config: SyncConfig, store: QuoteStore, remote: Arc<R>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            remote,
            store: Mutex::new(store),
            resolver: Mutex::new(ConflictResolver::new()),
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            events,
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// The engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The remote.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Subscribes to state changes and cycle outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Runs `f` against the store.
    pub fn read<T>(&self, f: impl FnOnce(&QuoteStore) -> T) -> T {
        f(&self.store.lock())
    }

    /// Pending conflicts from the last committed cycle.
    pub fn pending_conflicts(&self) -> Vec<ConflictRecord> {
        self.resolver.lock().pending().to_vec()
    }

    /// Adds a quote.
    ///
    /// # Errors
    ///
    /// Returns `SyncInProgress` during a cycle, otherwise any store error.
    pub fn add(&self, text: &str, author: &str, category: &str) -> SyncResult<Quote> {
        self.edit(|store| store.add(text, author, category))
    }

    /// Updates a quote.
    ///
    /// # Errors
    ///
    /// Returns `SyncInProgress` during a cycle, otherwise any store error.
    pub fn update(
        &self,
        id: &QuoteId,
        text: &str,
        author: &str,
        category: &str,
    ) -> SyncResult<Quote> {
        self.edit(|store| store.update(id, text, author, category))
    }

    /// Deletes a quote. Returns whether one was removed.
    ///
    /// # Errors
    ///
    /// Returns `SyncInProgress` during a cycle, otherwise any store error.
    pub fn delete(&self, id: &QuoteId) -> SyncResult<bool> {
        self.edit(|store| store.delete(id))
    }

    /// Imports quotes from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `SyncInProgress` during a cycle, otherwise any store error.
    pub fn import_json(&self, json: &str) -> SyncResult<ImportSummary> {
        self.edit(|store| store.import_json(json))
    }

    /// Selects the active category filter.
    ///
    /// Allowed during a cycle: the commit keeps the selection unless its
    /// category disappears.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    pub fn select_category(&self, name: &str) -> SyncResult<CategoryFilter> {
        Ok(self.store.lock().select_category(name)?)
    }

    /// Resolves the pending conflict for `id`.
    ///
    /// # Errors
    ///
    /// Returns `SyncInProgress` during a cycle, `ConflictNotFound` if no
    /// conflict is pending for `id`, or a store error.
    pub fn resolve_one(&self, id: &QuoteId, choice: ConflictChoice) -> SyncResult<ConflictRecord> {
        let state = self.state.read();
        if state.is_active() {
            return Err(self.reject("resolve", *state));
        }

        let (resolved, remaining) = {
            let mut resolver = self.resolver.lock();
            let mut store = self.store.lock();
            let resolved = resolver.resolve_one(&mut store, id, choice)?;
            (resolved, resolver.len())
        };
        self.emit(SyncEvent::ConflictsChanged(remaining));
        Ok(resolved)
    }

    /// Resolves every pending conflict with `choice`.
    ///
    /// # Errors
    ///
    /// Returns `SyncInProgress` during a cycle, or a store error.
    pub fn resolve_all(&self, choice: ConflictChoice) -> SyncResult<usize> {
        let state = self.state.read();
        if state.is_active() {
            return Err(self.reject("resolve", *state));
        }

        let resolved = {
            let mut resolver = self.resolver.lock();
            let mut store = self.store.lock();
            resolver.resolve_all(&mut store, choice)?
        };
        if resolved > 0 {
            self.emit(SyncEvent::ConflictsChanged(0));
        }
        Ok(resolved)
    }

    /// Runs one sync cycle: push local changes, fetch, merge, commit.
    ///
    /// # Errors
    ///
    /// Returns `SyncInProgress` if a cycle is already running. Any other
    /// failure moves the engine through `Error` back to `Idle` and leaves
    /// the store in its last good state.
    ///
    /// Dropping the returned future mid-cycle (for example by aborting the
    /// task running it) counts as a failed cycle and returns the engine to
    /// `Idle`.
    pub async fn sync(&self) -> SyncResult<SyncSummary> {
        self.begin()?;
        let guard = CycleGuard {
            engine: self,
            armed: true,
        };
        let start = Instant::now();
        tracing::debug!("sync cycle started");

        let result = self.run_cycle(start).await;
        guard.disarm();
        match result {
            Ok(summary) => {
                {
                    let mut stats = self.stats.write();
                    stats.cycles_completed += 1;
                    stats.quotes_pushed += summary.pushed_count as u64;
                    stats.quotes_queued += summary.queued_count as u64;
                    stats.conflicts_detected += summary.conflict_count as u64;
                    stats.last_sync = Some(Instant::now());
                    stats.last_error = None;
                }
                tracing::info!(
                    new = summary.new_count,
                    updated = summary.updated_count,
                    conflicts = summary.conflict_count,
                    pushed = summary.pushed_count,
                    queued = summary.queued_count,
                    "sync cycle committed"
                );
                self.set_state(SyncState::Idle);
                self.emit(SyncEvent::Completed(summary.clone()));
                Ok(summary)
            }
            Err(e) => {
                self.handle_error(&e);
                Err(e)
            }
        }
    }

    /// Starts periodic sync at the configured interval.
    pub fn start_periodic(self: &Arc<Self>) -> PeriodicSync
    where
        R: 'static,
    {
        PeriodicSync::spawn(
            Arc::clone(self),
            self.config.interval,
            self.config.task_name.clone(),
        )
    }

    async fn run_cycle(&self, start: Instant) -> SyncResult<SyncSummary> {
        let push = self.push_changes().await?;

        let server = self.call(self.remote.fetch()).await?.quotes;
        tracing::debug!(fetched = server.len(), "fetched server quotes");

        self.set_state(SyncState::Merging);
        let outcome = {
            let store = self.store.lock();
            merge(store.quotes(), &server, store.now_millis())
        };

        self.set_state(SyncState::Persisting);
        let conflict_count = outcome.conflict_count();
        {
            let mut store = self.store.lock();
            store.replace_all(outcome.quotes)?;
            let now = store.clock().now_utc();
            store.record_sync_time(now)?;
        }
        self.resolver.lock().replace(outcome.conflicts);
        self.emit(SyncEvent::ConflictsChanged(conflict_count));

        Ok(SyncSummary {
            new_count: outcome.new_count,
            updated_count: outcome.updated_count,
            conflict_count,
            pushed_count: push.pushed,
            queued_count: push.queued,
            duration: start.elapsed(),
        })
    }

    /// Pushes unsynced quotes plus the retry queue. Remote failures queue
    /// the outgoing quotes instead of failing the cycle.
    async fn push_changes(&self) -> SyncResult<PushReport> {
        let request = PushRequest::new(self.read(outgoing));
        if request.is_empty() {
            return Ok(PushReport {
                pushed: 0,
                queued: 0,
            });
        }

        let result = self.call(self.remote.push(request.clone())).await;
        let result = result.and_then(|response| {
            response.check(&request)?;
            Ok(response)
        });

        let mut store = self.store.lock();
        match result {
            Ok(response) => {
                // Rejected quotes stay unsynced; the fetch brings the newer
                // server copy and merge records the conflict
                let ids: HashSet<&QuoteId> =
                    response.applied(&request).into_iter().map(|q| &q.id).collect();
                let now = store.now_millis();
                let marked: Vec<Quote> = store
                    .quotes()
                    .iter()
                    .cloned()
                    .map(|mut q| {
                        if ids.contains(&q.id) {
                            q.mark_synced(now);
                        }
                        q
                    })
                    .collect();
                store.replace_all(marked)?;
                store.set_pending_sync(Vec::new())?;

                tracing::debug!(
                    pushed = response.accepted,
                    rejected = response.rejected.len(),
                    "pushed local changes"
                );
                Ok(PushReport {
                    pushed: response.accepted,
                    queued: 0,
                })
            }
            Err(e) if e.is_network() => {
                let queued = request.quotes.len();
                tracing::warn!(error = %e, queued, "push failed, queueing for retry");
                store.set_pending_sync(request.quotes)?;
                Ok(PushReport { pushed: 0, queued })
            }
            Err(e) => Err(e),
        }
    }

    /// Runs a remote call under the configured timeout.
    async fn call<T>(&self, fut: impl Future<Output = SyncResult<T>>) -> SyncResult<T> {
        match tokio::time::timeout(self.config.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout),
        }
    }

    fn edit<T>(&self, f: impl FnOnce(&mut QuoteStore) -> CoreResult<T>) -> SyncResult<T> {
        let state = self.state.read();
        if state.is_active() {
            return Err(self.reject("edit", *state));
        }
        let mut store = self.store.lock();
        Ok(f(&mut store)?)
    }

    fn begin(&self) -> SyncResult<()> {
        {
            let mut state = self.state.write();
            if !state.can_start_sync() {
                let current = *state;
                drop(state);
                return Err(self.reject("sync", current));
            }
            *state = SyncState::Fetching;
        }
        self.emit(SyncEvent::StateChanged(SyncState::Fetching));
        Ok(())
    }

    fn reject(&self, action: &'static str, state: SyncState) -> SyncError {
        if action == "sync" {
            self.stats.write().cycles_rejected += 1;
        }
        tracing::debug!(action, %state, "rejected while sync is running");
        SyncError::SyncInProgress
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
        self.emit(SyncEvent::StateChanged(state));
    }

    /// Reports an error and returns to idle.
    fn handle_error(&self, error: &SyncError) {
        tracing::warn!(error = %error, "sync cycle failed");
        self.set_state(SyncState::Error);
        {
            let mut stats = self.stats.write();
            stats.cycles_failed += 1;
            stats.last_error = Some(error.to_string());
        }
        self.emit(SyncEvent::Failed(error.to_string()));
        self.set_state(SyncState::Idle);
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Returns the engine to `Idle` if a running cycle is dropped before it
/// finishes.
struct CycleGuard<'a, R: RemoteStub> {
    engine: &'a SyncEngine<R>,
    armed: bool,
}

impl<R: RemoteStub> CycleGuard<'_, R> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<R: RemoteStub> Drop for CycleGuard<'_, R> {
    fn drop(&mut self) {
        if self.armed {
            self.engine.handle_error(&SyncError::Cancelled);
        }
    }
}

impl<R: RemoteStub> std::fmt::Debug for SyncEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Quotes to push: unsynced store quotes, then queued ones still present,
/// each once and in its current store version.
fn outgoing(store: &QuoteStore) -> Vec<Quote> {
    let mut seen = HashSet::new();
    let mut quotes = Vec::new();

    for quote in store.quotes().iter().filter(|q| q.needs_push()) {
        seen.insert(quote.id.clone());
        quotes.push(quote.clone());
    }
    for queued in store.pending_sync() {
        if seen.contains(&queued.id) {
            continue;
        }
        if let Some(current) = store.get(&queued.id) {
            seen.insert(current.id.clone());
            quotes.push(current.clone());
        }
    }
    quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockRemote;
    use quotesync_core::QuoteSource;
    use quotesync_sync_protocol::FetchResponse;
    use quotesync_testkit::{quote, TestStore};

    fn engine(fixture: TestStore) -> SyncEngine<MockRemote> {
        SyncEngine::new(SyncConfig::default(), fixture.store, MockRemote::new())
    }

    #[test]
    fn outgoing_dedupes_and_drops_deleted() {
        let mut fixture = TestStore::with_quotes(vec![
            quote("dirty").build(),
            quote("clean").synced().build(),
        ]);
        fixture
            .store
            .set_pending_sync(vec![
                quote("dirty").build(),
                quote("clean").build(),
                quote("gone").build(),
            ])
            .unwrap();

        let ids: Vec<String> = outgoing(&fixture.store)
            .into_iter()
            .map(|q| q.id.to_string())
            .collect();
        assert_eq!(ids, vec!["dirty", "clean"]);
    }

    #[tokio::test]
    async fn sync_marks_pushed_quotes_synced() {
        let engine = engine(TestStore::memory());
        let added = engine.add("T", "A", "C").unwrap();

        let summary = engine.sync().await.unwrap();
        assert_eq!(summary.pushed_count, 1);
        assert_eq!(engine.state(), SyncState::Idle);

        let stored = engine.read(|s| s.get(&added.id).cloned()).unwrap();
        assert_eq!(stored.source, QuoteSource::Synced);
        assert!(!stored.needs_push());
    }

    #[tokio::test]
    async fn sync_appends_server_quotes() {
        let engine = engine(TestStore::memory());
        engine.remote().set_fetch_response(FetchResponse::new(vec![
            quote("s-1").category("Remote").build(),
        ]));

        let summary = engine.sync().await.unwrap();
        assert_eq!(summary.new_count, 1);
        assert!(engine.read(|s| s.categories().contains("Remote")));
        assert!(engine.read(|s| s.last_sync_time().is_some()));
    }

    #[tokio::test]
    async fn fetch_failure_reports_and_returns_to_idle() {
        let engine = engine(TestStore::memory());
        let mut events = engine.subscribe();
        engine.remote().set_connected(false);

        let err = engine.sync().await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(engine.state(), SyncState::Idle);
        assert_eq!(engine.stats().cycles_failed, 1);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                SyncEvent::StateChanged(SyncState::Fetching),
                SyncEvent::StateChanged(SyncState::Error),
                SyncEvent::Failed(err.to_string()),
                SyncEvent::StateChanged(SyncState::Idle),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_cycle_returns_to_idle() {
        let engine = engine(TestStore::memory());
        engine.add("T", "A", "C").unwrap();
        engine.remote().set_fetch_delay(std::time::Duration::from_secs(5));

        let cut_short =
            tokio::time::timeout(std::time::Duration::from_secs(1), engine.sync()).await;
        assert!(cut_short.is_err());
        assert_eq!(engine.state(), SyncState::Idle);
        assert_eq!(engine.stats().cycles_failed, 1);
        assert_eq!(
            engine.stats().last_error.as_deref(),
            Some(SyncError::Cancelled.to_string().as_str())
        );

        engine.add("T2", "A", "C").unwrap();
        engine.remote().set_fetch_delay(std::time::Duration::ZERO);
        assert!(engine.sync().await.is_ok());
    }

    #[tokio::test]
    async fn resolving_without_conflicts_is_not_found() {
        let engine = engine(TestStore::memory());
        let result = engine.resolve_one(&QuoteId::new("q"), ConflictChoice::Server);
        assert!(matches!(result, Err(SyncError::ConflictNotFound(_))));
        assert_eq!(engine.resolve_all(ConflictChoice::Server).unwrap(), 0);
    }
}
