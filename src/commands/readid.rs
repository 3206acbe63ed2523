//! Read ID command implementation

use rvflash_core::clock::CycleCounter;
use rvflash_core::controller::SpiController;
use rvflash_core::flash::SpiFlash;
use std::io::Write;

/// Run the readid command
pub fn run_readid<C: SpiController, K: CycleCounter>(
    flash: &mut SpiFlash<C, K>,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = flash.read_id();
    log::info!("Found: {}", id);

    writeln!(out, "SPI flash identification:")?;
    writeln!(out, "  manufacturer ID = 0x{:02x}", id.manufacturer_id)?;
    writeln!(out, "  device ID       = 0x{:04x}", id.device_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_util::{driver, text};

    #[test]
    fn test_readid_output() {
        let mut flash = driver();
        let mut out = Vec::new();
        run_readid(&mut flash, &mut out).unwrap();
        assert_eq!(
            text(out),
            "SPI flash identification:\n  manufacturer ID = 0x20\n  device ID       = 0xba17\n"
        );
    }
}
