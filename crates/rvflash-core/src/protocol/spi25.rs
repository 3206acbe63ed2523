//! SPI25 command sequences with flag status completion
//!
//! Program and erase completion is read from the device's flag status
//! register, not from the controller's STATUS register. Both operations
//! share one sequence:
//!
//! 1. Query flags; fail with [`Error::NotReady`] if a previous operation is
//!    still running (nothing else is sent)
//! 2. Clear flags, write enable, issue the command
//! 3. Poll flags until READY or the class timeout expires
//!    ([`Error::Timeout`])
//! 4. READY with the operation's error bit set: clear flags again and fail
//!    with [`Error::Failed`]

use crate::bus;
use crate::clock::{CycleCounter, Deadline};
use crate::controller::SpiController;
use crate::error::{Error, Result};
use crate::flash::{DeviceId, FlashConfig};
use crate::spi::{opcodes, SpiCommand};
use bitflags::bitflags;

bitflags! {
    /// Device flag status register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FlagStatus: u8 {
        /// Last program operation failed
        const PROGRAM_ERROR = opcodes::FSR_PROGRAM_ERROR;
        /// Last erase operation failed
        const ERASE_ERROR   = opcodes::FSR_ERASE_ERROR;
        /// No program/erase operation in progress
        const READY         = opcodes::FSR_READY;
    }
}

impl FlagStatus {
    /// Whether the device is ready for a new program/erase operation
    pub fn is_ready(self) -> bool {
        self.contains(Self::READY)
    }
}

/// Read the flag status register
pub fn read_flags<C: SpiController + ?Sized>(ctrl: &mut C) -> FlagStatus {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(opcodes::READ_FLAGS, &mut buf);
    bus::execute(ctrl, &mut cmd);
    FlagStatus::from_bits_retain(buf[0])
}

/// Clear the error bits of the flag status register
pub fn clear_flags<C: SpiController + ?Sized>(ctrl: &mut C) {
    let mut cmd = SpiCommand::simple(opcodes::CLEAR_FLAGS);
    bus::execute(ctrl, &mut cmd);
}

/// Send the Write Enable command
pub fn write_enable<C: SpiController + ?Sized>(ctrl: &mut C) {
    let mut cmd = SpiCommand::simple(opcodes::WRITE_ENABLE);
    bus::execute(ctrl, &mut cmd);
}

/// Send the reset-to-single-wire command (0xFF)
pub fn reset_io_mode<C: SpiController + ?Sized>(ctrl: &mut C) {
    let mut cmd = SpiCommand::simple(opcodes::RESET_IO_MODE);
    bus::execute(ctrl, &mut cmd);
}

/// Leave dual I/O mode, also when the first command after power-up is lost
pub fn reset_sequence<C: SpiController + ?Sized>(ctrl: &mut C) {
    reset_io_mode(ctrl);
    reset_io_mode(ctrl);
}

/// Wait for a program/erase operation to complete
///
/// Queries the flag status register back to back until READY is set or
/// `timeout_us` has passed. The last flags read are returned either way;
/// on timeout READY is clear.
pub fn poll_completion<C, K>(
    ctrl: &mut C,
    clock: &mut K,
    timeout_us: u32,
    cycles_per_us: u32,
) -> FlagStatus
where
    C: SpiController + ?Sized,
    K: CycleCounter + ?Sized,
{
    let deadline = Deadline::after(clock.cycles(), timeout_us, cycles_per_us);

    loop {
        let flags = read_flags(ctrl);
        if flags.is_ready() || deadline.is_expired(clock.cycles()) {
            return flags;
        }
    }
}

/// Bring the device into a known state
///
/// Drains stale bytes from the controller, sends 0xFF twice (the first one
/// may be lost right after power-up; the second leaves dual I/O mode),
/// clears the flags and waits out any operation left running, using the
/// erase timeout.
pub fn init<C, K>(ctrl: &mut C, clock: &mut K, config: &FlashConfig)
where
    C: SpiController + ?Sized,
    K: CycleCounter + ?Sized,
{
    let stale = bus::drain(ctrl);
    if stale > 0 {
        log::trace!("spi: discarded {} stale bytes", stale);
    }

    reset_sequence(ctrl);
    clear_flags(ctrl);

    let flags = poll_completion(ctrl, clock, config.erase_timeout_us, config.cycles_per_us);
    if !flags.is_ready() {
        log::debug!("flash still busy after init (flags {:#04x})", flags.bits());
    }
}

/// Read the JEDEC identification
pub fn read_id<C: SpiController + ?Sized>(ctrl: &mut C) -> DeviceId {
    let mut buf = [0u8; 3];
    let mut cmd = SpiCommand::read_reg(opcodes::READ_ID, &mut buf);
    bus::execute(ctrl, &mut cmd);

    DeviceId {
        manufacturer_id: buf[0],
        device_id: ((buf[1] as u16) << 8) | (buf[2] as u16),
    }
}

/// Read `buf.len()` bytes starting at `addr` in a single READ command
pub fn read_mem<C: SpiController + ?Sized>(ctrl: &mut C, addr: u32, buf: &mut [u8]) {
    let mut cmd = SpiCommand::read_3b(opcodes::READ, addr, buf);
    bus::execute(ctrl, &mut cmd);
}

/// Program bytes within one page
///
/// All of `addr..addr + data.len()` must lie in the same page; the device
/// wraps around inside the page otherwise.
pub fn page_program<C, K>(
    ctrl: &mut C,
    clock: &mut K,
    config: &FlashConfig,
    addr: u32,
    data: &[u8],
) -> Result<()>
where
    C: SpiController + ?Sized,
    K: CycleCounter + ?Sized,
{
    let mut cmd = SpiCommand::write_3b(opcodes::PAGE_PROGRAM, addr, data);
    program_erase(
        ctrl,
        clock,
        &mut cmd,
        config.program_timeout_us,
        config.cycles_per_us,
        FlagStatus::PROGRAM_ERROR,
    )
}

/// Erase the sector containing `addr`
pub fn sector_erase<C, K>(
    ctrl: &mut C,
    clock: &mut K,
    config: &FlashConfig,
    addr: u32,
) -> Result<()>
where
    C: SpiController + ?Sized,
    K: CycleCounter + ?Sized,
{
    let mut cmd = SpiCommand::erase_3b(opcodes::SECTOR_ERASE, addr);
    program_erase(
        ctrl,
        clock,
        &mut cmd,
        config.erase_timeout_us,
        config.cycles_per_us,
        FlagStatus::ERASE_ERROR,
    )
}

fn program_erase<C, K>(
    ctrl: &mut C,
    clock: &mut K,
    cmd: &mut SpiCommand<'_>,
    timeout_us: u32,
    cycles_per_us: u32,
    error_flag: FlagStatus,
) -> Result<()>
where
    C: SpiController + ?Sized,
    K: CycleCounter + ?Sized,
{
    if !read_flags(ctrl).is_ready() {
        log::debug!("op {:#04x}: device not ready", cmd.opcode);
        return Err(Error::NotReady);
    }

    clear_flags(ctrl);
    write_enable(ctrl);
    bus::execute(ctrl, cmd);

    let flags = poll_completion(ctrl, clock, timeout_us, cycles_per_us);
    if !flags.is_ready() {
        log::debug!("op {:#04x}: timed out after {} us", cmd.opcode, timeout_us);
        return Err(Error::Timeout);
    }
    if flags.intersects(error_flag) {
        clear_flags(ctrl);
        log::debug!("op {:#04x}: device flags {:#04x}", cmd.opcode, flags.bits());
        return Err(Error::Failed);
    }

    Ok(())
}
