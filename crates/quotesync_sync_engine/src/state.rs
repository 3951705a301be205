//! Sync state, statistics and events.

use std::fmt;
use std::time::{Duration, Instant};

/// Phase of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// No cycle running.
    Idle,
    /// Pushing local changes and fetching the server list.
    Fetching,
    /// Merging the server list into the local one.
    Merging,
    /// Writing the merged list back to the store.
    Persisting,
    /// A cycle failed; the engine reports and returns to idle.
    Error,
}

impl SyncState {
    /// Returns true if a cycle is running.
    pub fn is_active(&self) -> bool {
        !matches!(self, SyncState::Idle)
    }

    /// Returns true if a new cycle can start.
    pub fn can_start_sync(&self) -> bool {
        matches!(self, SyncState::Idle)
    }

    /// Returns the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Fetching => "fetching",
            SyncState::Merging => "merging",
            SyncState::Persisting => "persisting",
            SyncState::Error => "error",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total number of cycles committed.
    pub cycles_completed: u64,
    /// Total number of cycles that failed.
    pub cycles_failed: u64,
    /// Total number of cycles rejected because one was already running.
    pub cycles_rejected: u64,
    /// Total number of quotes the remote accepted.
    pub quotes_pushed: u64,
    /// Total number of quotes queued after failed pushes.
    pub quotes_queued: u64,
    /// Total number of conflicts detected.
    pub conflicts_detected: u64,
    /// When the last cycle committed.
    pub last_sync: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Result of a committed sync cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    /// Server quotes new to the store.
    pub new_count: usize,
    /// Matched quotes replaced by the server copy.
    pub updated_count: usize,
    /// Conflicts detected by this cycle.
    pub conflict_count: usize,
    /// Quotes the remote accepted.
    pub pushed_count: usize,
    /// Quotes queued for retry after a failed push.
    pub queued_count: usize,
    /// Wall time of the cycle.
    pub duration: Duration,
}

/// Notification broadcast to engine subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The engine moved to a new state.
    StateChanged(SyncState),
    /// A cycle committed.
    Completed(SyncSummary),
    /// A cycle failed.
    Failed(String),
    /// The number of pending conflicts changed.
    ConflictsChanged(usize),
}
