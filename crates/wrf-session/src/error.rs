//! Session error types.

use thiserror::Error;
use wrf_protocol::ProtocolError;

/// Errors returned by session operations.
///
/// Replies from the module never surface here; they go through the event
/// handler. These are failures of the local side: backpressure, a request
/// that could not be encoded, or the byte sink refusing a write.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The send queue is at capacity. Service it and retry.
    #[error("send queue full: capacity {capacity}")]
    QueueFull {
        /// Queue capacity.
        capacity: usize,
    },

    /// A file upload is already negotiating or running.
    #[error("file transfer already in progress")]
    TransferInProgress,

    /// Request could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The byte sink failed. Not retried.
    #[error("write to module failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
