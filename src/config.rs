//! Configuration file loading
//!
//! Every table is optional; missing tables and keys fall back to the board
//! defaults:
//!
//! ```toml
//! [flash]
//! cycles_per_us = 100
//! program_timeout_us = 5000
//! erase_timeout_us = 3000000
//!
//! [device]
//! program_policy = "fail-on-dirty"
//! erase_busy_polls = 50
//!
//! [controller]
//! cmd_queue_depth = 2
//! rx_queue_depth = 2
//! shift_ticks = 2
//!
//! [clock]
//! start = 0
//! step = 1000
//! ```

use rvflash_core::flash::FlashConfig;
use rvflash_dummy::{ControllerConfig, DummyConfig, SimClock};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete tool configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Driver timing
    pub flash: FlashConfig,
    /// Emulated flash device
    pub device: DummyConfig,
    /// Emulated controller
    pub controller: ControllerConfig,
    /// Simulated cycle counter
    pub clock: SimClock,
}

impl Config {
    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
