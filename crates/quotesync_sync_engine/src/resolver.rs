//! Pending conflict log and its resolution.

use crate::error::{SyncError, SyncResult};
use quotesync_core::{Quote, QuoteId, QuoteSource, QuoteStore};
use quotesync_sync_protocol::{ConflictChoice, ConflictRecord};

/// Holds the conflicts produced by the last committed merge.
///
/// Resolutions are applied to the store in memory. The store is persisted
/// exactly once, when a resolution empties the pending list. If that persist
/// fails, the resolution is rolled back and its conflicts stay pending.
#[derive(Debug, Default)]
pub struct ConflictResolver {
    pending: Vec<ConflictRecord>,
}

impl ConflictResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pending list with a new merge's conflicts.
    pub fn replace(&mut self, conflicts: Vec<ConflictRecord>) {
        self.pending = conflicts;
    }

    /// Pending conflicts in detection order.
    pub fn pending(&self) -> &[ConflictRecord] {
        &self.pending
    }

    /// Returns the pending conflict for `id`.
    pub fn get(&self, id: &QuoteId) -> Option<&ConflictRecord> {
        self.pending.iter().find(|c| c.id == *id)
    }

    /// Number of pending conflicts.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Resolves the conflict for `id` with `choice`.
    ///
    /// Returns the resolved record. If the store no longer holds the quote,
    /// the conflict is discarded without touching the store.
    ///
    /// # Errors
    ///
    /// Returns `ConflictNotFound` if no conflict is pending for `id`, or a
    /// store error if the final persist fails. On a store error the store
    /// and the pending list are left as they were.
    pub fn resolve_one(
        &mut self,
        store: &mut QuoteStore,
        id: &QuoteId,
        choice: ConflictChoice,
    ) -> SyncResult<ConflictRecord> {
        let index = self
            .pending
            .iter()
            .position(|c| c.id == *id)
            .ok_or_else(|| SyncError::ConflictNotFound(id.to_string()))?;

        let checkpoint = store.checkpoint();
        let mut conflict = self.pending.remove(index);
        apply(store, &conflict, choice);

        if self.pending.is_empty() {
            if let Err(e) = store.persist() {
                tracing::warn!(id = %id, error = %e, "persist failed, conflict kept pending");
                store.rollback(checkpoint);
                self.pending.insert(index, conflict);
                return Err(e.into());
            }
        }
        conflict.resolve();
        tracing::debug!(id = %id, %choice, remaining = self.pending.len(), "resolved conflict");
        Ok(conflict)
    }

    /// Applies `choice` to every pending conflict and clears the list.
    ///
    /// Returns how many conflicts were resolved.
    ///
    /// # Errors
    ///
    /// Returns a store error if the persist fails, leaving the store and
    /// the pending list as they were.
    pub fn resolve_all(
        &mut self,
        store: &mut QuoteStore,
        choice: ConflictChoice,
    ) -> SyncResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let checkpoint = store.checkpoint();
        for conflict in &self.pending {
            apply(store, conflict, choice);
        }
        if let Err(e) = store.persist() {
            tracing::warn!(error = %e, "persist failed, conflicts kept pending");
            store.rollback(checkpoint);
            return Err(e.into());
        }

        let resolved = self.pending.len();
        self.pending.clear();

        tracing::info!(resolved, %choice, "resolved all conflicts");
        Ok(resolved)
    }
}

/// Writes the chosen snapshot into the store. Returns false if the quote is
/// gone.
fn apply(store: &mut QuoteStore, conflict: &ConflictRecord, choice: ConflictChoice) -> bool {
    let snapshot = match choice {
        ConflictChoice::Server => conflict
            .server
            .clone()
            .with_source(QuoteSource::Server)
            .with_last_synced(Some(conflict.server.timestamp)),
        ConflictChoice::Local => Quote {
            timestamp: store
                .now_millis()
                .max(conflict.server.timestamp.saturating_add(1))
                .max(conflict.local.timestamp),
            source: QuoteSource::Local,
            last_synced: None,
            ..conflict.local.clone()
        },
    };

    let applied = store.apply_snapshot(snapshot);
    if !applied {
        tracing::debug!(id = %conflict.id, "discarding conflict for deleted quote");
    }
    applied
}
