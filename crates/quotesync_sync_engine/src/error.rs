//! Error types for the sync engine.

use quotesync_core::CoreError;
use quotesync_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// None of these are fatal: the engine returns to idle after each one and
/// the store keeps its last good state.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote failed or was unreachable.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
    },

    /// A remote call did not finish within the configured timeout.
    #[error("remote call timed out")]
    Timeout,

    /// A sync cycle is already running.
    #[error("sync already in progress")]
    SyncInProgress,

    /// A running cycle was dropped before it finished.
    #[error("sync cycle cancelled")]
    Cancelled,

    /// No pending conflict has the given id.
    #[error("no pending conflict for quote {0}")]
    ConflictNotFound(String),

    /// The remote sent a malformed or inconsistent message.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Store error.
    #[error("store error: {0}")]
    Core(#[from] CoreError),
}

impl SyncError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Returns true if this error came from talking to the remote.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SyncError::Network { .. } | SyncError::Timeout | SyncError::Protocol(_)
        )
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Network { .. } | SyncError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_classification() {
        assert!(SyncError::network("connection reset").is_network());
        assert!(SyncError::Timeout.is_network());
        assert!(SyncError::Protocol(ProtocolError::invalid("x")).is_network());
        assert!(!SyncError::SyncInProgress.is_network());
        assert!(!SyncError::Core(CoreError::empty_field("text")).is_network());
    }

    #[test]
    fn retryable_errors() {
        assert!(SyncError::network("connection lost").is_retryable());
        assert!(SyncError::Timeout.is_retryable());
        assert!(!SyncError::Protocol(ProtocolError::invalid("x")).is_retryable());
        assert!(!SyncError::ConflictNotFound("q".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        assert_eq!(SyncError::SyncInProgress.to_string(), "sync already in progress");
        assert_eq!(
            SyncError::network("offline").to_string(),
            "network error: offline"
        );
        assert!(SyncError::ConflictNotFound("q-1".into())
            .to_string()
            .contains("q-1"));
    }
}
