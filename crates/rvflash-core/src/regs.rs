//! SPI controller register map and board constants
//!
//! Offsets are relative to the controller base address. The controller is
//! a simple byte-at-a-time shifter with a command queue and a receive queue.

// ============================================================================
// Register offsets
// ============================================================================

/// Status register (read-only)
pub const REG_STATUS: usize = 0x0;
/// Slave select register (write-only, nonzero asserts chip select)
pub const REG_SLAVESEL: usize = 0x4;
/// Data register (write: byte to send, read: next received byte)
pub const REG_DATA: usize = 0x8;

// ============================================================================
// Status register bits
// ============================================================================

/// Controller is shifting or has queued bytes
pub const STATUS_BUSY: u32 = 1 << 0;
/// Command queue can accept another byte
pub const STATUS_CMD_READY: u32 = 1 << 1;
/// Receive queue holds at least one byte
pub const STATUS_READ_READY: u32 = 1 << 2;

// ============================================================================
// Data register
// ============================================================================

/// Written to DATA to clock in one byte while keeping chip select asserted.
/// One bit beyond the 8-bit data width, so it is a control word, not data.
pub const DATA_DUMMY: u32 = 0x100;

// ============================================================================
// TE0890 board
// ============================================================================

/// Base address of the SPI flash controller
pub const SPIFLASH_BASE: usize = 0xF000_4000;
/// Processor clock frequency in MHz (cycle counter ticks per microsecond)
pub const CPU_FREQ_MHZ: u32 = 100;
/// Flash page size in bytes
pub const PAGE_SIZE: u32 = 256;
/// Flash sector (erase unit) size in bytes
pub const SECTOR_SIZE: u32 = 64 * 1024;
/// Flash device capacity in bytes
pub const FLASH_SIZE: u32 = 8 * 1024 * 1024;
/// Value of every byte after an erase
pub const ERASED_VALUE: u8 = 0xFF;
