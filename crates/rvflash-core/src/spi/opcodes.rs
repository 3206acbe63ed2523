//! SPI flash opcodes
//!
//! Single-wire opcodes of the Micron-style NOR flash on the board. The
//! flag status register commands (0x70/0x50) are vendor specific; the rest
//! follow the common JEDEC conventions.

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + device ID)
pub const READ_ID: u8 = 0x9F;

// ============================================================================
// Read commands - 3-byte address
// ============================================================================

/// Read Data
pub const READ: u8 = 0x03;

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any program/erase operation
pub const WRITE_ENABLE: u8 = 0x06;

// ============================================================================
// Flag status register
// ============================================================================

/// Read Flag Status Register
pub const READ_FLAGS: u8 = 0x70;
/// Clear Flag Status Register (error bits)
pub const CLEAR_FLAGS: u8 = 0x50;

// ============================================================================
// Program / erase - 3-byte address
// ============================================================================

/// Page Program
pub const PAGE_PROGRAM: u8 = 0x02;
/// Sector Erase (64 KiB)
pub const SECTOR_ERASE: u8 = 0xD8;

// ============================================================================
// Mode control
// ============================================================================

/// Reset from dual/quad I/O mode back to extended (single-wire) SPI mode
pub const RESET_IO_MODE: u8 = 0xFF;

// ============================================================================
// Flag status register bit definitions
// ============================================================================

/// Flag Status: program error
pub const FSR_PROGRAM_ERROR: u8 = 1 << 4;
/// Flag Status: erase error
pub const FSR_ERASE_ERROR: u8 = 1 << 5;
/// Flag Status: ready (no program/erase in progress)
pub const FSR_READY: u8 = 1 << 7;
