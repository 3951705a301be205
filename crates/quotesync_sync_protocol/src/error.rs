//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors from encoding, decoding or validating wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A body could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A decoded message is inconsistent with the request it answers.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Creates an invalid message error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidMessage(message.into())
    }
}
