//! Emulated NOR flash device
//!
//! The device sees the bus one byte at a time, the way it would on the
//! wire: [`DummyFlash::shift_in`] for bytes the controller sends,
//! [`DummyFlash::shift_dummy`] for dummy clocks (returns the byte the device
//! drives back) and [`DummyFlash::deselect`] when chip select goes high.
//! Write-class commands take effect on deselect, as on real parts.

use rvflash_core::regs::{ERASED_VALUE, FLASH_SIZE, PAGE_SIZE, SECTOR_SIZE};
use rvflash_core::spi::opcodes;

use crate::error::ConfigError;

/// What PAGE PROGRAM does to bytes that are not erased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ProgramPolicy {
    /// Programming only clears bits: new = old & data
    #[default]
    AndBits,
    /// Refuse to program over non-erased bytes and raise PROGRAM_ERROR
    FailOnDirty,
}

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct DummyConfig {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC device ID
    pub device_id: u16,
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Sector size for erase
    pub sector_size: usize,
    /// Behaviour when programming non-erased bytes
    pub program_policy: ProgramPolicy,
    /// Flag status queries that report busy after a page program
    pub program_busy_polls: u32,
    /// Flag status queries that report busy after a sector erase
    pub erase_busy_polls: u32,
    /// Lose the first command after power-up
    pub drop_first_command: bool,
    /// Power up in dual I/O mode (single-wire commands are not understood)
    pub start_in_dual_io: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0x20, // Micron
            device_id: 0xBA17,     // N25Q064A
            size: FLASH_SIZE as usize,
            page_size: PAGE_SIZE as usize,
            sector_size: SECTOR_SIZE as usize,
            program_policy: ProgramPolicy::AndBits,
            program_busy_polls: 3,
            erase_busy_polls: 20,
            drop_first_command: true,
            start_in_dual_io: false,
        }
    }
}

impl DummyConfig {
    /// Check the geometry is something a NOR part could have
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.page_size.is_power_of_two() {
            return Err(ConfigError::Geometry("page size must be a power of two"));
        }
        if !self.sector_size.is_power_of_two() || self.sector_size < self.page_size {
            return Err(ConfigError::Geometry(
                "sector size must be a power of two no smaller than a page",
            ));
        }
        if self.size == 0 || self.size % self.sector_size != 0 {
            return Err(ConfigError::Geometry("size must be a multiple of the sector size"));
        }
        if self.size > 1 << 24 {
            return Err(ConfigError::Geometry("size exceeds the 24-bit address space"));
        }
        Ok(())
    }
}

/// One chip-select session as seen by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Bytes sent by the controller (opcode, address, payload)
    pub bytes: Vec<u8>,
    /// Dummy-clocked bytes read back
    pub dummies: usize,
    /// Whether the device ignored the command
    pub ignored: bool,
}

impl Transaction {
    /// First byte of the session
    pub fn opcode(&self) -> Option<u8> {
        self.bytes.first().copied()
    }
}

/// Counters kept by the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// READ FLAGS commands executed
    pub flag_queries: usize,
    /// PAGE PROGRAM commands started
    pub programs: usize,
    /// SECTOR ERASE commands started
    pub erases: usize,
    /// Commands the device did not act on
    pub ignored: usize,
}

/// Dummy flash device
///
/// Emulates a flash chip in memory for testing purposes.
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    error_flags: u8,
    busy_polls: u32,
    stuck_busy: bool,
    write_enabled: bool,
    dual_io: bool,
    drop_next: bool,
    fail_next_program: bool,
    fail_next_erase: bool,
    session: Vec<u8>,
    session_dummies: usize,
    stats: DeviceStats,
    log: Vec<Transaction>,
}

impl DummyFlash {
    /// Create a new, fully erased dummy flash
    pub fn new(config: DummyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let data = vec![ERASED_VALUE; config.size];
        let mut flash = Self {
            config,
            data,
            error_flags: 0,
            busy_polls: 0,
            stuck_busy: false,
            write_enabled: false,
            dual_io: false,
            drop_next: false,
            fail_next_program: false,
            fail_next_erase: false,
            session: Vec::new(),
            session_dummies: 0,
            stats: DeviceStats::default(),
            log: Vec::new(),
        };
        flash.power_cycle();
        Ok(flash)
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Result<Self, ConfigError> {
        let mut flash = Self::new(config)?;
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        Ok(flash)
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Device counters
    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Every completed chip-select session, oldest first
    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    /// Forget the transaction log
    pub fn clear_transactions(&mut self) {
        self.log.clear();
    }

    /// Power the device off and on: volatile state is lost, the array kept
    pub fn power_cycle(&mut self) {
        self.error_flags = 0;
        self.busy_polls = 0;
        self.stuck_busy = false;
        self.write_enabled = false;
        self.dual_io = self.config.start_in_dual_io;
        self.drop_next = self.config.drop_first_command;
        self.session.clear();
        self.session_dummies = 0;
    }

    /// Pretend a program/erase is running for the next `polls` flag queries
    pub fn force_busy(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    /// Never finish the current (or next) program/erase
    pub fn stick_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Make the next page program report PROGRAM_ERROR
    pub fn fail_next_program(&mut self) {
        self.fail_next_program = true;
    }

    /// Make the next sector erase report ERASE_ERROR
    pub fn fail_next_erase(&mut self) {
        self.fail_next_erase = true;
    }

    /// Whether a program/erase operation is in progress
    pub fn is_busy(&self) -> bool {
        self.stuck_busy || self.busy_polls > 0
    }

    /// Whether the device is in dual I/O mode
    pub fn in_dual_io(&self) -> bool {
        self.dual_io
    }

    /// Current flag status register value
    pub fn flag_status(&self) -> u8 {
        let ready = if self.is_busy() { 0 } else { opcodes::FSR_READY };
        ready | self.error_flags
    }

    /// Byte sent by the controller
    pub fn shift_in(&mut self, byte: u8) {
        self.session.push(byte);
    }

    /// Dummy clock: returns the byte driven back by the device
    pub fn shift_dummy(&mut self) -> u8 {
        let index = self.session_dummies;
        self.session_dummies += 1;

        if self.drop_next || self.dual_io {
            return 0xFF;
        }

        match self.session.first().copied() {
            Some(opcodes::READ_ID) => match index {
                0 => self.config.manufacturer_id,
                1 => (self.config.device_id >> 8) as u8,
                2 => self.config.device_id as u8,
                _ => 0x00,
            },
            Some(opcodes::READ_FLAGS) => self.flag_status(),
            Some(opcodes::READ) if self.session.len() >= 4 => {
                let addr = self.session_address() as usize + index;
                self.data[addr % self.data.len()]
            }
            _ => 0xFF,
        }
    }

    /// Chip select released: execute the command
    pub fn deselect(&mut self) {
        if self.session.is_empty() && self.session_dummies == 0 {
            return;
        }

        let bytes = core::mem::take(&mut self.session);
        let dummies = core::mem::replace(&mut self.session_dummies, 0);
        let ignored = !self.execute(&bytes);
        if ignored {
            self.stats.ignored += 1;
        }
        self.log.push(Transaction {
            bytes,
            dummies,
            ignored,
        });
    }

    fn session_address(&self) -> u32 {
        ((self.session[1] as u32) << 16) | ((self.session[2] as u32) << 8) | self.session[3] as u32
    }

    /// Returns false if the command was ignored
    fn execute(&mut self, bytes: &[u8]) -> bool {
        if self.drop_next {
            self.drop_next = false;
            log::debug!("dummy: first command after power-up lost");
            return false;
        }
        let Some(&opcode) = bytes.first() else {
            return false;
        };
        if self.dual_io {
            if opcode == opcodes::RESET_IO_MODE {
                self.dual_io = false;
                return true;
            }
            return false;
        }

        match opcode {
            opcodes::RESET_IO_MODE | opcodes::READ | opcodes::READ_ID => true,
            opcodes::READ_FLAGS => {
                self.stats.flag_queries += 1;
                if self.busy_polls > 0 {
                    self.busy_polls -= 1;
                }
                true
            }
            opcodes::CLEAR_FLAGS => {
                self.error_flags = 0;
                true
            }
            opcodes::WRITE_ENABLE => {
                if self.is_busy() {
                    return false;
                }
                self.write_enabled = true;
                true
            }
            opcodes::PAGE_PROGRAM => self.page_program(bytes),
            opcodes::SECTOR_ERASE => self.sector_erase(bytes),
            _ => {
                log::warn!("dummy: unsupported opcode {:#04x}", opcode);
                false
            }
        }
    }

    fn start_operation(&mut self, bytes: &[u8]) -> Option<usize> {
        if self.is_busy() || !self.write_enabled || bytes.len() < 4 {
            log::warn!(
                "dummy: op {:#04x} ignored (busy={}, wel={}, len={})",
                bytes[0],
                self.is_busy(),
                self.write_enabled,
                bytes.len()
            );
            return None;
        }
        self.write_enabled = false;
        let addr = ((bytes[1] as usize) << 16) | ((bytes[2] as usize) << 8) | bytes[3] as usize;
        Some(addr % self.data.len())
    }

    fn page_program(&mut self, bytes: &[u8]) -> bool {
        let Some(addr) = self.start_operation(bytes) else {
            return false;
        };
        self.stats.programs += 1;
        self.busy_polls = self.config.program_busy_polls;

        let page_size = self.config.page_size;
        let page_base = addr & !(page_size - 1);
        let payload = &bytes[4..];
        // Only the last page_size bytes survive when more are sent
        let skip = payload.len().saturating_sub(page_size);
        let first = (addr - page_base + skip) % page_size;

        log::debug!("dummy: program {} bytes at {:#08x}", payload.len() - skip, addr);

        if core::mem::take(&mut self.fail_next_program) {
            self.error_flags |= opcodes::FSR_PROGRAM_ERROR;
            return true;
        }

        let target = |i: usize| page_base + (first + i) % page_size;
        if self.config.program_policy == ProgramPolicy::FailOnDirty
            && (0..payload.len() - skip).any(|i| self.data[target(i)] != ERASED_VALUE)
        {
            self.error_flags |= opcodes::FSR_PROGRAM_ERROR;
            return true;
        }

        for (i, &byte) in payload[skip..].iter().enumerate() {
            self.data[target(i)] &= byte;
        }
        true
    }

    fn sector_erase(&mut self, bytes: &[u8]) -> bool {
        let Some(addr) = self.start_operation(bytes) else {
            return false;
        };
        self.stats.erases += 1;
        self.busy_polls = self.config.erase_busy_polls;

        let sector_size = self.config.sector_size;
        let base = addr & !(sector_size - 1);
        log::debug!("dummy: erase sector at {:#08x}", base);

        if core::mem::take(&mut self.fail_next_erase) {
            self.error_flags |= opcodes::FSR_ERASE_ERROR;
            return true;
        }

        self.data[base..base + sector_size].fill(ERASED_VALUE);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> DummyConfig {
        DummyConfig {
            size: 64 * 1024,
            sector_size: 4096,
            page_size: 256,
            drop_first_command: false,
            ..DummyConfig::default()
        }
    }

    fn command(flash: &mut DummyFlash, bytes: &[u8]) {
        for &b in bytes {
            flash.shift_in(b);
        }
        flash.deselect();
    }

    fn query(flash: &mut DummyFlash, bytes: &[u8], reply: &mut [u8]) {
        for &b in bytes {
            flash.shift_in(b);
        }
        for r in reply.iter_mut() {
            *r = flash.shift_dummy();
        }
        flash.deselect();
    }

    #[test]
    fn test_read_id() {
        let mut flash = DummyFlash::new(small_config()).unwrap();
        let mut id = [0u8; 3];
        query(&mut flash, &[opcodes::READ_ID], &mut id);
        assert_eq!(id, [0x20, 0xBA, 0x17]);
    }

    #[test]
    fn test_program_wraps_inside_page() {
        let mut flash = DummyFlash::new(small_config()).unwrap();
        command(&mut flash, &[opcodes::WRITE_ENABLE]);
        command(&mut flash, &[opcodes::PAGE_PROGRAM, 0x00, 0x01, 0xFE, 1, 2, 3, 4]);

        assert_eq!(&flash.data()[0x1FE..0x200], &[1, 2]);
        assert_eq!(&flash.data()[0x100..0x102], &[3, 4]);
        assert_eq!(flash.data()[0x200], 0xFF);
    }

    #[test]
    fn test_program_without_write_enable_ignored() {
        let mut flash = DummyFlash::new(small_config()).unwrap();
        command(&mut flash, &[opcodes::PAGE_PROGRAM, 0, 0, 0, 0x00]);
        assert_eq!(flash.data()[0], 0xFF);
        assert!(flash.transactions()[0].ignored);
        assert_eq!(flash.stats().ignored, 1);
    }

    #[test]
    fn test_busy_counts_down_per_flag_query() {
        let mut flash = DummyFlash::new(small_config()).unwrap();
        flash.force_busy(2);
        let mut flags = [0u8; 1];
        for expect_ready in [false, false, true] {
            query(&mut flash, &[opcodes::READ_FLAGS], &mut flags);
            assert_eq!(flags[0] & opcodes::FSR_READY != 0, expect_ready);
        }
        assert_eq!(flash.stats().flag_queries, 3);
    }

    #[test]
    fn test_erase_aligns_to_sector() {
        let mut flash = DummyFlash::with_data(small_config(), &[0u8; 3 * 4096]).unwrap();
        command(&mut flash, &[opcodes::WRITE_ENABLE]);
        command(&mut flash, &[opcodes::SECTOR_ERASE, 0x00, 0x12, 0x34]);
        assert!(flash.data()[0x1000..0x2000].iter().all(|&b| b == 0xFF));
        assert_eq!(flash.data()[0x0FFF], 0);
        assert_eq!(flash.data()[0x2000], 0);
    }

    #[test]
    fn test_first_command_after_power_up_lost() {
        let mut flash = DummyFlash::new(DummyConfig {
            drop_first_command: true,
            ..small_config()
        })
        .unwrap();
        let mut id = [0u8; 3];
        query(&mut flash, &[opcodes::READ_ID], &mut id);
        assert_eq!(id, [0xFF; 3]);
        query(&mut flash, &[opcodes::READ_ID], &mut id);
        assert_eq!(id, [0x20, 0xBA, 0x17]);
    }

    #[test]
    fn test_dual_io_mode_needs_reset() {
        let mut flash = DummyFlash::new(DummyConfig {
            start_in_dual_io: true,
            ..small_config()
        })
        .unwrap();
        command(&mut flash, &[opcodes::WRITE_ENABLE]);
        assert!(flash.transactions()[0].ignored);
        command(&mut flash, &[opcodes::RESET_IO_MODE]);
        assert!(!flash.in_dual_io());
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let cfg = DummyConfig {
            page_size: 300,
            ..small_config()
        };
        assert!(matches!(DummyFlash::new(cfg), Err(ConfigError::Geometry(_))));
    }
}
