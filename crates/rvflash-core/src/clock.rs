//! Cycle counter and timeout deadlines
//!
//! Timeouts are absolute cycle-counter values. Comparison goes through
//! wrapping subtraction, so a deadline stays correct when the counter (or
//! the deadline itself) wraps around.

/// Monotonic free-running cycle counter
pub trait CycleCounter {
    /// Current counter value
    fn cycles(&mut self) -> u64;
}

impl<T: CycleCounter + ?Sized> CycleCounter for &mut T {
    fn cycles(&mut self) -> u64 {
        (**self).cycles()
    }
}

const EXPIRED_BIT: u64 = 1 << 63;

/// Absolute point in cycle-counter time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    end: u64,
}

impl Deadline {
    /// Deadline `timeout_us` microseconds after `now`
    pub fn after(now: u64, timeout_us: u32, cycles_per_us: u32) -> Self {
        let span = cycles_per_us as u64 * timeout_us as u64;
        Self {
            end: now.wrapping_add(span),
        }
    }

    /// Counter value at which the deadline falls
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Whether `now` is past the deadline
    ///
    /// The remaining time is treated as unsigned; a value with the top bit
    /// set means the deadline has already passed.
    pub fn is_expired(&self, now: u64) -> bool {
        self.end.wrapping_sub(now) & EXPIRED_BIT != 0
    }
}

/// The RISC-V `cycle` CSR
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct RdCycle;

#[cfg(target_arch = "riscv32")]
impl CycleCounter for RdCycle {
    fn cycles(&mut self) -> u64 {
        // Re-read when the high half moved while reading the low half
        loop {
            let hi: u32;
            let lo: u32;
            let hi2: u32;
            unsafe {
                core::arch::asm!(
                    "rdcycleh {0}",
                    "rdcycle {1}",
                    "rdcycleh {2}",
                    out(reg) hi,
                    out(reg) lo,
                    out(reg) hi2,
                    options(nomem, nostack),
                );
            }
            if hi == hi2 {
                return ((hi as u64) << 32) | lo as u64;
            }
        }
    }
}

#[cfg(target_arch = "riscv64")]
impl CycleCounter for RdCycle {
    fn cycles(&mut self) -> u64 {
        let cycles: u64;
        unsafe {
            core::arch::asm!("rdcycle {0}", out(reg) cycles, options(nomem, nostack));
        }
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_span() {
        let d = Deadline::after(1_000, 5_000, 100);
        assert_eq!(d.end(), 501_000);
        assert!(!d.is_expired(1_000));
        assert!(!d.is_expired(501_000));
        assert!(d.is_expired(501_001));
    }

    #[test]
    fn test_deadline_wraps_past_counter_end() {
        let now = u64::MAX - 99;
        let d = Deadline::after(now, 2, 100);
        // end_time overflows the counter width
        assert_eq!(d.end(), 100);
        assert!(!d.is_expired(now));
        assert!(!d.is_expired(u64::MAX));
        assert!(!d.is_expired(0));
        assert!(!d.is_expired(100));
        assert!(d.is_expired(101));
        assert!(d.is_expired(1_000));
    }

    #[test]
    fn test_deadline_zero_timeout() {
        let d = Deadline::after(42, 0, 100);
        assert!(!d.is_expired(42));
        assert!(d.is_expired(43));
    }

    #[test]
    fn test_long_erase_timeout_does_not_overflow() {
        let d = Deadline::after(0, u32::MAX, u32::MAX);
        assert_eq!(d.end(), u32::MAX as u64 * u32::MAX as u64);
        assert!(!d.is_expired(d.end() - 1));
    }
}
