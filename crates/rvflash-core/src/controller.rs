//! SPI controller register block
//!
//! [`SpiController`] is the minimal set of register operations the driver
//! needs. [`MmioController`] implements it for the real memory-mapped
//! controller; emulators implement it in software.

use crate::regs::{
    DATA_DUMMY, REG_DATA, REG_SLAVESEL, REG_STATUS, STATUS_BUSY, STATUS_CMD_READY,
    STATUS_READ_READY,
};
use bitflags::bitflags;

bitflags! {
    /// Controller STATUS register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControllerStatus: u32 {
        /// A byte is being shifted or bytes are still queued
        const BUSY       = STATUS_BUSY;
        /// The command queue accepts another byte or dummy request
        const CMD_READY  = STATUS_CMD_READY;
        /// A received byte is waiting in the receive queue
        const READ_READY = STATUS_READ_READY;
    }
}

/// Register-level access to the SPI controller
///
/// Chip select is asserted implicitly by the first byte written to the data
/// register and stays asserted until [`set_slave_select`] is called with
/// `false`.
///
/// [`set_slave_select`]: SpiController::set_slave_select
pub trait SpiController {
    /// Read the STATUS register
    fn status(&mut self) -> ControllerStatus;

    /// Queue one byte for transmission
    fn write_data(&mut self, byte: u8);

    /// Queue one dummy-clocked byte; the byte shifted in lands in the
    /// receive queue
    fn request_dummy_byte(&mut self);

    /// Dequeue one received byte
    fn read_data(&mut self) -> u8;

    /// Assert (`true`) or deassert (`false`) chip select
    fn set_slave_select(&mut self, asserted: bool);
}

impl<T: SpiController + ?Sized> SpiController for &mut T {
    fn status(&mut self) -> ControllerStatus {
        (**self).status()
    }

    fn write_data(&mut self, byte: u8) {
        (**self).write_data(byte)
    }

    fn request_dummy_byte(&mut self) {
        (**self).request_dummy_byte()
    }

    fn read_data(&mut self) -> u8 {
        (**self).read_data()
    }

    fn set_slave_select(&mut self, asserted: bool) {
        (**self).set_slave_select(asserted)
    }
}

/// Memory-mapped SPI controller
pub struct MmioController {
    base: usize,
}

impl MmioController {
    /// Create a controller handle for the register block at `base`
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    /// - `base` maps the SPI controller's three 32-bit registers
    /// - No other code accesses the controller while this handle exists
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of the register block
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        // SAFETY: `new` guarantees the register block is mapped at `base`
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write32(&mut self, offset: usize, value: u32) {
        // SAFETY: `new` guarantees the register block is mapped at `base`
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}

impl SpiController for MmioController {
    fn status(&mut self) -> ControllerStatus {
        ControllerStatus::from_bits_truncate(self.read32(REG_STATUS))
    }

    fn write_data(&mut self, byte: u8) {
        self.write32(REG_DATA, byte as u32);
    }

    fn request_dummy_byte(&mut self) {
        self.write32(REG_DATA, DATA_DUMMY);
    }

    fn read_data(&mut self) -> u8 {
        self.read32(REG_DATA) as u8
    }

    fn set_slave_select(&mut self, asserted: bool) {
        self.write32(REG_SLAVESEL, asserted as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Plain memory standing in for the register block
    fn regs() -> [u32; 3] {
        [0; 3]
    }

    #[test]
    fn test_mmio_register_offsets() {
        let mut mem = regs();
        let mut ctrl = unsafe { MmioController::new(mem.as_mut_ptr() as usize) };

        ctrl.write_data(0xA5);
        ctrl.set_slave_select(true);
        assert_eq!(mem[2], 0xA5);
        assert_eq!(mem[1], 1);

        let mut ctrl = unsafe { MmioController::new(mem.as_mut_ptr() as usize) };
        ctrl.request_dummy_byte();
        ctrl.set_slave_select(false);
        assert_eq!(mem[2], DATA_DUMMY);
        assert_eq!(mem[1], 0);
    }

    #[test]
    fn test_mmio_status_and_data_read() {
        let mut mem = regs();
        mem[0] = STATUS_CMD_READY | STATUS_READ_READY | 0x80;
        mem[2] = 0x1_5A;
        let mut ctrl = unsafe { MmioController::new(mem.as_mut_ptr() as usize) };

        let status = ctrl.status();
        assert!(status.contains(ControllerStatus::CMD_READY | ControllerStatus::READ_READY));
        assert!(!status.contains(ControllerStatus::BUSY));
        assert_eq!(ctrl.read_data(), 0x5A);
    }
}
