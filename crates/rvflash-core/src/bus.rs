//! Byte-level bus primitives and transaction framing
//!
//! All waits here are tight, hardware-paced polls of the STATUS register
//! without a timeout: a controller that never becomes ready is a hardware
//! fault outside the driver's failure model.

use crate::controller::{ControllerStatus, SpiController};
use crate::spi::{encode_address, SpiCommand};

/// Wait for room in the command queue, then queue `byte`
pub fn send_byte<C: SpiController + ?Sized>(ctrl: &mut C, byte: u8) {
    while !ctrl.status().contains(ControllerStatus::CMD_READY) {}
    ctrl.write_data(byte);
}

/// Clock in `buf.len()` bytes with dummy cycles
///
/// Dummy requests and received bytes are handled in the same loop: the
/// controller pipelines both sides independently, so requesting everything
/// up front can overflow the receive queue and draining before requesting
/// would never finish. The loop ends once every requested byte has been
/// captured, so request count and capture count are both `buf.len()`.
pub fn read_bytes<C: SpiController + ?Sized>(ctrl: &mut C, buf: &mut [u8]) {
    let mut pending_to_send = buf.len();
    let mut filled = 0;

    while filled < buf.len() {
        let status = ctrl.status();
        if pending_to_send > 0 && status.contains(ControllerStatus::CMD_READY) {
            ctrl.request_dummy_byte();
            pending_to_send -= 1;
        }
        if status.contains(ControllerStatus::READ_READY) {
            buf[filled] = ctrl.read_data();
            filled += 1;
        }
    }
}

/// Wait until the controller is idle, then deassert chip select
///
/// The last clock of a command must have left the controller before chip
/// select changes, otherwise the device does not latch the command.
pub fn end_transaction<C: SpiController + ?Sized>(ctrl: &mut C) {
    while ctrl.status().contains(ControllerStatus::BUSY) {}
    ctrl.set_slave_select(false);
}

/// Discard stale received bytes and wait for the controller to go idle
///
/// Returns the number of bytes discarded.
pub fn drain<C: SpiController + ?Sized>(ctrl: &mut C) -> usize {
    let mut discarded = 0;
    loop {
        let status = ctrl.status();
        if status.contains(ControllerStatus::READ_READY) {
            ctrl.read_data();
            discarded += 1;
        } else if !status.contains(ControllerStatus::BUSY) {
            return discarded;
        }
    }
}

/// Run one complete transaction
///
/// Sends the opcode, the 24-bit address (most significant byte first), the
/// payload, then captures the reply. Always ends with [`end_transaction`].
pub fn execute<C: SpiController + ?Sized>(ctrl: &mut C, cmd: &mut SpiCommand<'_>) {
    log::trace!(
        "spi: op={:#04x} addr={:?} write={} read={}",
        cmd.opcode,
        cmd.address,
        cmd.write_data.len(),
        cmd.read_buf.len()
    );

    send_byte(ctrl, cmd.opcode);
    if let Some(addr) = cmd.address {
        for byte in encode_address(addr) {
            send_byte(ctrl, byte);
        }
    }
    for &byte in cmd.write_data {
        send_byte(ctrl, byte);
    }
    if cmd.has_read() {
        read_bytes(ctrl, cmd.read_buf);
    }
    end_transaction(ctrl);
}
