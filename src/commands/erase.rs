//! Erase command implementation

use rvflash_core::clock::CycleCounter;
use rvflash_core::controller::SpiController;
use rvflash_core::flash::SpiFlash;
use rvflash_core::regs::SECTOR_SIZE;
use std::io::Write;

/// Run the erase command
pub fn run_erase<C: SpiController, K: CycleCounter>(
    flash: &mut SpiFlash<C, K>,
    addr: u32,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let sector = addr & !(SECTOR_SIZE - 1);
    write!(out, "Erasing sector at 0x{:06x} ... ", sector)?;

    let result = flash.sector_erase(addr);
    super::report(out, result)?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_util::{driver, text};

    #[test]
    fn test_erase_ok() {
        let mut flash = driver();
        flash.page_program(0x12_0000, &[0x00]).unwrap();

        let mut out = Vec::new();
        run_erase(&mut flash, 0x12_3456, &mut out).unwrap();
        assert_eq!(text(out), "Erasing sector at 0x120000 ... OK\n");
        assert_eq!(flash.controller().flash().data()[0x12_0000], 0xFF);
    }

    #[test]
    fn test_erase_reports_error_code() {
        let mut flash = driver();
        flash.controller_mut().flash_mut().force_busy(10);

        let mut out = Vec::new();
        assert!(run_erase(&mut flash, 0, &mut out).is_err());
        assert_eq!(text(out), "Erasing sector at 0x000000 ... ERROR code -3\n");
    }
}
