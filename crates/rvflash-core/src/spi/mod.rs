//! SPI types and command structures
//!
//! This module provides the transaction descriptor and the opcodes the
//! driver sends to the flash device.

mod command;
pub mod opcodes;

pub use command::{encode_address, SpiCommand, ADDRESS_MASK};
pub use opcodes::*;
