//! rvflash-dummy - Emulated SPI controller and flash for testing
//!
//! [`DummyController`] implements the controller register interface on top
//! of queues that fill and drain as STATUS is polled, with a [`DummyFlash`]
//! on the other end of the bus. Together with [`SimClock`] the whole driver
//! runs on the host without hardware:
//!
//! ```
//! use rvflash_core::flash::FlashConfig;
//! use rvflash_dummy::{ControllerConfig, DummyConfig, SimClock};
//!
//! let mut flash = rvflash_dummy::new_driver(
//!     FlashConfig::default(),
//!     DummyConfig::default(),
//!     ControllerConfig::default(),
//!     SimClock::default(),
//! )
//! .unwrap();
//! flash.init();
//! assert_eq!(flash.read_id().manufacturer_id, 0x20);
//! ```
//!
//! The controller counts register accesses a real controller would
//! mishandle (see [`Violations`]), so tests can check protocol correctness
//! and not only results.

mod clock;
mod controller;
mod device;
mod error;

pub use clock::SimClock;
pub use controller::{
    ControllerConfig, ControllerStats, DummyController, Violations, MAX_QUEUE_DEPTH,
};
pub use device::{DeviceStats, DummyConfig, DummyFlash, ProgramPolicy, Transaction};
pub use error::{ConfigError, Result};

use rvflash_core::flash::{FlashConfig, SpiFlash};

/// Driver running against the emulator
pub type DummyDriver = SpiFlash<DummyController, SimClock>;

/// Build a driver on top of a fresh emulated flash
pub fn new_driver(
    flash: FlashConfig,
    device: DummyConfig,
    controller: ControllerConfig,
    clock: SimClock,
) -> Result<DummyDriver> {
    let device = DummyFlash::new(device)?;
    driver_for(flash, device, controller, clock)
}

/// Build a driver around an existing emulated flash
pub fn driver_for(
    flash: FlashConfig,
    device: DummyFlash,
    controller: ControllerConfig,
    clock: SimClock,
) -> Result<DummyDriver> {
    let ctrl = DummyController::new(controller, device)?;
    Ok(SpiFlash::new(ctrl, clock, flash))
}
