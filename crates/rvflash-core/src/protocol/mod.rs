//! Protocol implementations
//!
//! This module contains the SPI flash command sequences built on top of
//! the bus primitives: flag status polling and the program/erase state
//! sequences.

mod spi25;

pub use spi25::*;
