//! SPI flash driver
//!
//! [`SpiFlash`] bundles a controller, a cycle counter and the timing
//! configuration. Every method takes `&mut self`, which is what keeps the
//! single shared bus to one transaction at a time. If interrupt handlers
//! also touch the controller, callers still have to serialize around each
//! call (e.g. by masking interrupts).

use core::fmt;

use crate::clock::CycleCounter;
use crate::controller::SpiController;
use crate::error::Result;
use crate::protocol::{self, FlagStatus};
use crate::regs::CPU_FREQ_MHZ;

/// Default page program timeout
pub const PROGRAM_TIMEOUT_US: u32 = 5_000;
/// Default sector erase timeout
pub const ERASE_TIMEOUT_US: u32 = 3_000_000;

/// Timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct FlashConfig {
    /// Cycle counter ticks per microsecond
    pub cycles_per_us: u32,
    /// Page program timeout in microseconds
    pub program_timeout_us: u32,
    /// Sector erase timeout in microseconds (also used by init)
    pub erase_timeout_us: u32,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            cycles_per_us: CPU_FREQ_MHZ,
            program_timeout_us: PROGRAM_TIMEOUT_US,
            erase_timeout_us: ERASE_TIMEOUT_US,
        }
    }
}

/// Result of the READ ID command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// Device ID (memory type and capacity, big-endian on the wire)
    pub device_id: u16,
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mfr=0x{:02x} dev=0x{:04x}",
            self.manufacturer_id, self.device_id
        )
    }
}

/// SPI flash driver
pub struct SpiFlash<C, K> {
    ctrl: C,
    clock: K,
    config: FlashConfig,
}

impl<C: SpiController, K: CycleCounter> SpiFlash<C, K> {
    /// Create a driver; call [`init`](Self::init) before anything else
    pub fn new(ctrl: C, clock: K, config: FlashConfig) -> Self {
        Self {
            ctrl,
            clock,
            config,
        }
    }

    /// Bring the device into a known state
    ///
    /// Tolerates any prior device state, including a program/erase left
    /// running by a previous session.
    pub fn init(&mut self) {
        protocol::init(&mut self.ctrl, &mut self.clock, &self.config);
    }

    /// Read the manufacturer and device ID
    pub fn read_id(&mut self) -> DeviceId {
        protocol::read_id(&mut self.ctrl)
    }

    /// Read `buf.len()` bytes starting at `addr`
    pub fn read_mem(&mut self, addr: u32, buf: &mut [u8]) {
        protocol::read_mem(&mut self.ctrl, addr, buf);
    }

    /// Program `data` at `addr`
    ///
    /// The whole range must lie within one page; this is not checked.
    pub fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        protocol::page_program(&mut self.ctrl, &mut self.clock, &self.config, addr, data)
    }

    /// Erase the sector containing `addr`
    pub fn sector_erase(&mut self, addr: u32) -> Result<()> {
        protocol::sector_erase(&mut self.ctrl, &mut self.clock, &self.config, addr)
    }

    /// Read the device's flag status register
    pub fn read_flags(&mut self) -> FlagStatus {
        protocol::read_flags(&mut self.ctrl)
    }

    /// Current cycle counter value
    pub fn cycles(&mut self) -> u64 {
        self.clock.cycles()
    }

    /// Get a mutable reference to the cycle counter
    pub fn clock_mut(&mut self) -> &mut K {
        &mut self.clock
    }

    /// Timing configuration
    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Get a reference to the controller
    pub fn controller(&self) -> &C {
        &self.ctrl
    }

    /// Get a mutable reference to the controller
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.ctrl
    }

    /// Give back the controller and the cycle counter
    pub fn release(self) -> (C, K) {
        (self.ctrl, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn test_default_config_matches_board() {
        let cfg = FlashConfig::default();
        assert_eq!(cfg.cycles_per_us, 100);
        assert_eq!(cfg.program_timeout_us, 5_000);
        assert_eq!(cfg.erase_timeout_us, 3_000_000);
    }

    #[test]
    fn test_device_id_display() {
        let id = DeviceId {
            manufacturer_id: 0x20,
            device_id: 0xBA17,
        };
        assert_eq!(format!("{}", id), "mfr=0x20 dev=0xba17");
    }
}
