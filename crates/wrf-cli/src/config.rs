//! YAML configuration for the `wrf` binary.
//!
//! Every section is optional:
//!
//! ```yaml
//! address: 127.0.0.1:9100
//! timeout_ms: 5000
//! engine:
//!   receive_buffer_size: 1024
//!   queue_size: 10
//! poll:
//!   interval_ms: 10000
//! setup:
//!   debug_mode: none
//!   error_mode: all
//!   token: "..."
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wrf_protocol::WrfConfig;
use wrf_session::{EngineConfig, PollConfig};

/// Default address of the UART bridge.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9100";
/// Default time to wait for a reply in one-shot commands.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// `host:port` of the TCP bridge in front of the module's UART.
    pub address: String,
    /// Milliseconds a one-shot command waits before giving up.
    pub timeout_ms: u64,
    pub engine: EngineConfig,
    pub poll: PollConfig,
    /// Configuration sent by `wrf setup`.
    pub setup: WrfConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            address: DEFAULT_ADDRESS.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            engine: EngineConfig::default(),
            poll: PollConfig::default(),
            setup: WrfConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }
}
