//! Emulated SPI controller
//!
//! Models the SoC controller closely enough to catch protocol mistakes:
//! a command queue feeding a single shifter, and a receive queue for bytes
//! clocked in by dummy requests. Time only moves when STATUS is read; each
//! read is one tick.

use heapless::Deque;
use rvflash_core::controller::{ControllerStatus, SpiController};

use crate::device::DummyFlash;
use crate::error::{ConfigError, Result};

/// Largest queue depth the emulator supports
pub const MAX_QUEUE_DEPTH: usize = 16;

/// Controller timing and queue sizes
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ControllerConfig {
    /// Entries in the command queue
    pub cmd_queue_depth: usize,
    /// Entries in the receive queue
    pub rx_queue_depth: usize,
    /// STATUS reads needed to shift one byte
    pub shift_ticks: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cmd_queue_depth: 2,
            rx_queue_depth: 2,
            shift_ticks: 2,
        }
    }
}

impl ControllerConfig {
    /// Check queue depths and timing
    pub fn validate(&self) -> Result<()> {
        for (name, depth) in [
            ("command queue", self.cmd_queue_depth),
            ("receive queue", self.rx_queue_depth),
        ] {
            if depth == 0 || depth > MAX_QUEUE_DEPTH {
                return Err(ConfigError::QueueDepth {
                    name,
                    depth,
                    max: MAX_QUEUE_DEPTH,
                });
            }
        }
        if self.shift_ticks == 0 {
            return Err(ConfigError::ShiftTicks);
        }
        Ok(())
    }
}

/// Register accesses that real hardware would mishandle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Violations {
    /// Chip select released while bytes were still queued or shifting
    pub deselect_while_busy: usize,
    /// DATA written with the command queue full
    pub write_while_full: usize,
    /// DATA read with the receive queue empty
    pub read_while_empty: usize,
    /// Received byte dropped because the receive queue was full
    pub rx_overflow: usize,
}

impl Violations {
    /// Sum of all violations
    pub fn total(&self) -> usize {
        self.deselect_while_busy + self.write_while_full + self.read_while_empty + self.rx_overflow
    }
}

/// Register access counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// STATUS reads (ticks)
    pub status_reads: usize,
    /// Data bytes queued
    pub bytes_sent: usize,
    /// Dummy-byte requests queued
    pub dummy_requests: usize,
    /// Bytes dequeued from DATA
    pub bytes_received: usize,
}

#[derive(Debug, Clone, Copy)]
enum Item {
    Byte(u8),
    Dummy,
}

/// Emulated SPI controller with a flash device on its bus
pub struct DummyController {
    config: ControllerConfig,
    flash: DummyFlash,
    cmd_queue: Deque<Item, MAX_QUEUE_DEPTH>,
    rx_queue: Deque<u8, MAX_QUEUE_DEPTH>,
    shifter: Option<(Item, u32)>,
    selected: bool,
    stats: ControllerStats,
    violations: Violations,
}

impl DummyController {
    /// Attach `flash` to a controller
    pub fn new(config: ControllerConfig, flash: DummyFlash) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            flash,
            cmd_queue: Deque::new(),
            rx_queue: Deque::new(),
            shifter: None,
            selected: false,
            stats: ControllerStats::default(),
            violations: Violations::default(),
        })
    }

    /// The attached flash device
    pub fn flash(&self) -> &DummyFlash {
        &self.flash
    }

    /// The attached flash device, mutably
    pub fn flash_mut(&mut self) -> &mut DummyFlash {
        &mut self.flash
    }

    /// Detach the flash device
    pub fn into_flash(self) -> DummyFlash {
        self.flash
    }

    /// Register access counters
    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    /// Protocol violations seen so far
    pub fn violations(&self) -> Violations {
        self.violations
    }

    /// Whether chip select is asserted
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Leave bytes in the receive queue, as an interrupted earlier
    /// session would
    pub fn inject_stale_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.rx_queue.push_back(byte).is_err() {
                break;
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.shifter.is_some() || !self.cmd_queue.is_empty()
    }

    fn tick(&mut self) {
        if let Some((item, remaining)) = self.shifter.take() {
            if remaining > 1 {
                self.shifter = Some((item, remaining - 1));
            } else {
                self.complete(item);
            }
        }
        if self.shifter.is_none() {
            if let Some(item) = self.cmd_queue.pop_front() {
                self.shifter = Some((item, self.config.shift_ticks));
            }
        }
    }

    fn complete(&mut self, item: Item) {
        match item {
            Item::Byte(byte) => self.flash.shift_in(byte),
            Item::Dummy => {
                let byte = self.flash.shift_dummy();
                if self.rx_queue.len() >= self.config.rx_queue_depth
                    || self.rx_queue.push_back(byte).is_err()
                {
                    log::warn!("controller: receive queue overflow, byte {:#04x} lost", byte);
                    self.violations.rx_overflow += 1;
                }
            }
        }
    }

    fn enqueue(&mut self, item: Item) {
        self.selected = true;
        if self.cmd_queue.len() >= self.config.cmd_queue_depth
            || self.cmd_queue.push_back(item).is_err()
        {
            log::warn!("controller: DATA written with full command queue");
            self.violations.write_while_full += 1;
        }
    }
}

impl SpiController for DummyController {
    fn status(&mut self) -> ControllerStatus {
        self.stats.status_reads += 1;
        self.tick();

        let mut status = ControllerStatus::empty();
        if self.is_busy() {
            status |= ControllerStatus::BUSY;
        }
        if self.cmd_queue.len() < self.config.cmd_queue_depth {
            status |= ControllerStatus::CMD_READY;
        }
        if !self.rx_queue.is_empty() {
            status |= ControllerStatus::READ_READY;
        }
        status
    }

    fn write_data(&mut self, byte: u8) {
        self.stats.bytes_sent += 1;
        self.enqueue(Item::Byte(byte));
    }

    fn request_dummy_byte(&mut self) {
        self.stats.dummy_requests += 1;
        self.enqueue(Item::Dummy);
    }

    fn read_data(&mut self) -> u8 {
        match self.rx_queue.pop_front() {
            Some(byte) => {
                self.stats.bytes_received += 1;
                byte
            }
            None => {
                log::warn!("controller: DATA read with empty receive queue");
                self.violations.read_while_empty += 1;
                0
            }
        }
    }

    fn set_slave_select(&mut self, asserted: bool) {
        if asserted {
            self.selected = true;
            return;
        }
        if self.is_busy() {
            log::warn!("controller: chip select released while busy");
            self.violations.deselect_while_busy += 1;
        }
        self.selected = false;
        self.flash.deselect();
    }
}
