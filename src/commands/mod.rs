//! CLI command implementations
//!
//! Commands take an initialized [`SpiFlash`](rvflash_core::flash::SpiFlash)
//! and write their report to `out`, so they run the same against the
//! emulator or a memory-mapped controller.

mod erase;
mod read;
mod readid;
mod writetest;

pub use erase::run_erase;
pub use read::{run_read, run_read_to_file};
pub use readid::run_readid;
pub use writetest::run_writetest;

use std::io::{self, Write};

/// Print `OK` or the boot monitor style error code; returns 1 on error
fn report(out: &mut impl Write, result: rvflash_core::Result<()>) -> io::Result<usize> {
    match result {
        Ok(()) => {
            writeln!(out, "OK")?;
            Ok(0)
        }
        Err(e) => {
            log::debug!("{}", e);
            writeln!(out, "ERROR code {}", e.code())?;
            Ok(1)
        }
    }
}

/// Print `OK` or `FAILED!`; returns 1 on failure
fn check(out: &mut impl Write, good: bool) -> io::Result<usize> {
    if good {
        writeln!(out, "OK")?;
        Ok(0)
    } else {
        writeln!(out, "FAILED!")?;
        Ok(1)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use rvflash_core::flash::FlashConfig;
    use rvflash_dummy::{ControllerConfig, DummyConfig, DummyDriver, DummyFlash, SimClock};

    /// Initialized driver on a fresh emulated flash
    pub fn driver() -> DummyDriver {
        driver_with(DummyFlash::new(DummyConfig::default()).unwrap())
    }

    /// Initialized driver on the given emulated flash
    pub fn driver_with(device: DummyFlash) -> DummyDriver {
        let mut flash = rvflash_dummy::driver_for(
            FlashConfig::default(),
            device,
            ControllerConfig::default(),
            SimClock::default(),
        )
        .unwrap();
        flash.init();
        flash
    }

    /// Output captured from a command
    pub fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }
}
