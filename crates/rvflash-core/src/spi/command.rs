//! SPI command structure

/// Addresses are sent as 24 bits; higher bits are dropped
pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Encode a 24-bit address, most significant byte first
pub fn encode_address(address: u32) -> [u8; 3] {
    let address = address & ADDRESS_MASK;
    [(address >> 16) as u8, (address >> 8) as u8, address as u8]
}

/// A single SPI transaction
///
/// Borrows its payload and reply buffers, so building one never allocates.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// 24-bit address (if any)
    pub address: Option<u32>,

    /// Data to write after opcode/address
    pub write_data: &'a [u8],

    /// Buffer to read the reply into
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WRITE_ENABLE)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., READ_FLAGS)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a read command with 3-byte address (e.g., READ)
    pub fn read_3b(opcode: u8, addr: u32, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a write command with 3-byte address (e.g., PAGE_PROGRAM)
    pub fn write_3b(opcode: u8, addr: u32, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an erase command with 3-byte address and no payload
    pub fn erase_3b(opcode: u8, addr: u32) -> Self {
        Self::write_3b(opcode, addr, &[])
    }

    /// Returns true if this command has a read phase
    pub fn has_read(&self) -> bool {
        !self.read_buf.is_empty()
    }

    /// Returns true if this command has a write phase
    pub fn has_write(&self) -> bool {
        !self.write_data.is_empty()
    }

    /// Returns true if this command has an address phase
    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Total number of bytes clocked over the bus
    pub fn total_bytes(&self) -> usize {
        let mut total = 1; // opcode
        if self.has_address() {
            total += 3;
        }
        total += self.write_data.len();
        total += self.read_buf.len();
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;

    #[test]
    fn test_address_msb_first_and_truncated() {
        assert_eq!(encode_address(0x7F_0100), [0x7F, 0x01, 0x00]);
        assert_eq!(encode_address(0xAB12_3456), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_command_shapes() {
        let cmd = SpiCommand::simple(opcodes::WRITE_ENABLE);
        assert!(!cmd.has_address() && !cmd.has_write() && !cmd.has_read());
        assert_eq!(cmd.total_bytes(), 1);

        let mut buf = [0u8; 3];
        let cmd = SpiCommand::read_reg(opcodes::READ_ID, &mut buf);
        assert!(cmd.has_read() && !cmd.has_address());
        assert_eq!(cmd.total_bytes(), 4);

        let mut buf = [0u8; 32];
        let cmd = SpiCommand::read_3b(opcodes::READ, 0x10, &mut buf);
        assert_eq!(cmd.total_bytes(), 36);

        let data = [1u8, 2, 3];
        let cmd = SpiCommand::write_3b(opcodes::PAGE_PROGRAM, 0x10, &data);
        assert!(cmd.has_write() && !cmd.has_read());
        assert_eq!(cmd.total_bytes(), 7);

        let cmd = SpiCommand::erase_3b(opcodes::SECTOR_ERASE, 0x7F_0000);
        assert_eq!(cmd.address, Some(0x7F_0000));
        assert_eq!(cmd.total_bytes(), 4);
    }
}
