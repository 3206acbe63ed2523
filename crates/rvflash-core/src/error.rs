//! Error types for rvflash-core
//!
//! Only write-class operations (page program, sector erase) can fail.
//! Reads and identification have no failure path at this level: a missing
//! or dead device simply returns whatever the bus shifted in.

use core::fmt;

/// Program/erase failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// Device reported ready but flagged a program or erase error.
    /// The flag status register has already been cleared again.
    Failed,
    /// Device did not report ready within the operation's timeout
    Timeout,
    /// A previous program/erase operation is still in progress.
    /// Nothing but the flag status query was sent to the device.
    NotReady,
}

impl Error {
    /// Numeric code as printed by the boot monitor (`ERROR code -N`)
    pub const fn code(self) -> i32 {
        match self {
            Self::Failed => -1,
            Self::Timeout => -2,
            Self::NotReady => -3,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed => write!(f, "flash operation failed"),
            Self::Timeout => write!(f, "flash operation timed out"),
            Self::NotReady => write!(f, "flash busy with a previous program/erase operation"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_match_monitor() {
        assert_eq!(Error::Failed.code(), -1);
        assert_eq!(Error::Timeout.code(), -2);
        assert_eq!(Error::NotReady.code(), -3);
    }
}
