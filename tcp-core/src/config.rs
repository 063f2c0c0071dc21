//! Per-connection configuration
//!
//! Only two knobs exist: the byte capacity of each stream buffer and the
//! initial retransmission timeout. Both can be loaded from TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Capacity of each stream buffer in bytes
    #[serde(default = "default_capacity")]
    pub capacity: u64,
    /// Initial retransmission timeout in milliseconds
    #[serde(default = "default_initial_rto_ms")]
    pub initial_rto_ms: u64,
}

fn default_capacity() -> u64 {
    64_000
}

fn default_initial_rto_ms() -> u64 {
    1000
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            capacity: default_capacity(),
            initial_rto_ms: default_initial_rto_ms(),
        }
    }
}

impl TcpConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: TcpConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the protocol cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be non-zero".to_string()));
        }
        if self.initial_rto_ms == 0 {
            return Err(ConfigError::Invalid(
                "initial_rto_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the initial retransmission timeout as Duration
    pub fn initial_rto(&self) -> Duration {
        Duration::from_millis(self.initial_rto_ms)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
