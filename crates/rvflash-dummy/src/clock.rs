//! Simulated cycle counter

use rvflash_core::clock::CycleCounter;

/// Cycle counter that advances by a fixed step every time it is read
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct SimClock {
    /// Next value returned
    pub start: u64,
    /// Increment per read
    pub step: u64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            start: 0,
            step: 1_000,
        }
    }
}

impl SimClock {
    /// Clock starting at `start`, advancing `step` cycles per read
    pub fn new(start: u64, step: u64) -> Self {
        Self { start, step }
    }

    /// Value the next read returns, without advancing
    pub fn now(&self) -> u64 {
        self.start
    }
}

impl CycleCounter for SimClock {
    fn cycles(&mut self) -> u64 {
        let now = self.start;
        self.start = self.start.wrapping_add(self.step);
        now
    }
}
