//! rvflash-core - SPI flash driver for the RISC-V test SoC
//!
//! This crate drives a NOR flash chip attached to the SoC's memory-mapped
//! SPI controller. It is `no_std` and allocation free; every operation is a
//! sequence of busy-wait polling loops run to completion before returning.
//!
//! The driver is layered, and data only flows downward:
//!
//! ```text
//! flash::SpiFlash          init / read_id / read_mem / page_program / sector_erase
//!        │
//! protocol                 flag-status polling, program/erase sequences
//!        │
//! bus + spi::SpiCommand    transaction framing (opcode, address, payload, reply)
//!        │
//! controller::SpiController   STATUS / SLAVESEL / DATA registers
//! ```
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`Error`]
//! - `serde` - Deserialize [`flash::FlashConfig`] from configuration files
//!
//! # Example
//!
//! ```ignore
//! use rvflash_core::clock::RdCycle;
//! use rvflash_core::controller::MmioController;
//! use rvflash_core::flash::{FlashConfig, SpiFlash};
//! use rvflash_core::regs::SPIFLASH_BASE;
//!
//! let ctrl = unsafe { MmioController::new(SPIFLASH_BASE) };
//! let mut flash = SpiFlash::new(ctrl, RdCycle, FlashConfig::default());
//! flash.init();
//! let id = flash.read_id();
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bus;
pub mod clock;
pub mod controller;
pub mod error;
pub mod flash;
pub mod protocol;
pub mod regs;
pub mod spi;

pub use error::{Error, Result};
