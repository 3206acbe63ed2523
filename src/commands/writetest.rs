//! Write test command implementation
//!
//! Erases a scratch sector, checks it reads back erased, programs the first
//! two pages with a message and a cycle-counter stamp and reads them back.

use rvflash_core::clock::CycleCounter;
use rvflash_core::controller::SpiController;
use rvflash_core::flash::SpiFlash;
use rvflash_core::regs::{ERASED_VALUE, PAGE_SIZE, SECTOR_SIZE};
use std::io::Write;

use super::{check, report};

/// Bytes read per verification window
const WINDOW: usize = 32;

const MESSAGES: [&[u8; 16]; 2] = [b"Flash write test", b"Another testpage"];

/// Message followed by the stamp, little-endian
fn test_pattern(message: &[u8; 16], stamp: u64) -> [u8; 24] {
    let mut data = [0u8; 24];
    data[..16].copy_from_slice(message);
    data[16..].copy_from_slice(&stamp.to_le_bytes());
    data
}

/// Run the write test on the sector containing `sector`
pub fn run_writetest<C: SpiController, K: CycleCounter>(
    flash: &mut SpiFlash<C, K>,
    sector: u32,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let sector = sector & !(SECTOR_SIZE - 1);
    let mut failures = 0;
    let mut buf = [0u8; WINDOW];

    writeln!(out, "Test SPI flash program/erase functions:")?;

    write!(out, "  Erasing sector at 0x{:06x} ... ", sector)?;
    failures += report(out, flash.sector_erase(sector))?;

    write!(out, "  Read back erased sector ... ")?;
    let mut erased = true;
    for offset in (0..SECTOR_SIZE).step_by(WINDOW) {
        flash.read_mem(sector + offset, &mut buf);
        erased &= buf.iter().all(|&b| b == ERASED_VALUE);
    }
    failures += check(out, erased)?;

    let mut expected = [[ERASED_VALUE; WINDOW]; 2];
    for (page, message) in MESSAGES.iter().enumerate() {
        let pattern = test_pattern(message, flash.cycles());
        expected[page][..pattern.len()].copy_from_slice(&pattern);

        let page_addr = sector + page as u32 * PAGE_SIZE;
        write!(out, "  Programming page at 0x{:06x} ... ", page_addr)?;
        failures += report(out, flash.page_program(page_addr, &pattern))?;
    }

    for (page, expect) in expected.iter().enumerate() {
        let page_addr = sector + page as u32 * PAGE_SIZE;
        write!(out, "  Reading back page at 0x{:06x} ... ", page_addr)?;
        flash.read_mem(page_addr, &mut buf);
        if buf != *expect {
            log::debug!("page {:#08x}: read {:02x?}", page_addr, buf);
        }
        failures += check(out, buf == *expect)?;
    }

    if failures > 0 {
        return Err(format!("Write test failed: {} step(s) did not pass", failures).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LAST_SECTOR;
    use crate::commands::test_util::{driver, driver_with, text};
    use rvflash_dummy::{DummyConfig, DummyFlash};

    #[test]
    fn test_writetest_passes() {
        let mut flash = driver();
        let mut out = Vec::new();
        run_writetest(&mut flash, LAST_SECTOR, &mut out).unwrap();

        assert_eq!(
            text(out),
            "Test SPI flash program/erase functions:\n\
             \x20 Erasing sector at 0x7f0000 ... OK\n\
             \x20 Read back erased sector ... OK\n\
             \x20 Programming page at 0x7f0000 ... OK\n\
             \x20 Programming page at 0x7f0100 ... OK\n\
             \x20 Reading back page at 0x7f0000 ... OK\n\
             \x20 Reading back page at 0x7f0100 ... OK\n"
        );

        let data = flash.controller().flash().data();
        assert_eq!(&data[0x7F_0000..0x7F_0010], b"Flash write test");
        assert_eq!(&data[0x7F_0100..0x7F_0110], b"Another testpage");
        assert!(data[0x7F_0018..0x7F_0100].iter().all(|&b| b == 0xFF));
        assert_eq!(flash.controller().violations().total(), 0);
    }

    #[test]
    fn test_writetest_stamps_differ() {
        let mut flash = driver();
        run_writetest(&mut flash, 0x1_0000, &mut Vec::new()).unwrap();

        let data = flash.controller().flash().data();
        let stamp = |at: usize| u64::from_le_bytes(data[at..at + 8].try_into().unwrap());
        assert!(stamp(0x1_0110) > stamp(0x1_0010));
    }

    #[test]
    fn test_writetest_reports_erase_failure() {
        let image = vec![0u8; 0x2_0000];
        let mut flash =
            driver_with(DummyFlash::with_data(DummyConfig::default(), &image).unwrap());
        flash.controller_mut().flash_mut().fail_next_erase();

        let mut out = Vec::new();
        assert!(run_writetest(&mut flash, 0x1_0000, &mut out).is_err());

        let text = text(out);
        assert!(text.contains("Erasing sector at 0x010000 ... ERROR code -1\n"));
        assert!(text.contains("Read back erased sector ... FAILED!\n"));
        assert!(text.contains("Reading back page at 0x010000 ... FAILED!\n"));
    }
}
