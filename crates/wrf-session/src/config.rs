//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default receive buffer size in bytes.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 1024;
/// Default number of queued requests.
pub const DEFAULT_QUEUE_SIZE: usize = 10;
/// Default interval between polls in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

/// Sizing of the engine's buffers, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest frame accepted from the module, terminator included.
    pub receive_buffer_size: usize,
    /// Number of requests that can wait for transmission.
    pub queue_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}

/// Polling policy for [`crate::PollScheduler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Milliseconds between polls.
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}
