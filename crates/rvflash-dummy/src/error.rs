//! Error types for the emulator

use thiserror::Error;

/// Emulator configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Flash geometry is inconsistent
    #[error("Invalid flash geometry: {0}")]
    Geometry(&'static str),

    /// Controller queue depth outside the supported range
    #[error("Invalid {name} depth {depth} (supported: 1..={max})")]
    QueueDepth {
        name: &'static str,
        depth: usize,
        max: usize,
    },

    /// Shift time of zero ticks
    #[error("Shift time must be at least one tick")]
    ShiftTicks,
}

/// Result type for emulator setup
pub type Result<T> = std::result::Result<T, ConfigError>;
