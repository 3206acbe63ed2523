//! CLI argument parsing

use clap::{Parser, Subcommand};
use rvflash_core::regs::{FLASH_SIZE, SECTOR_SIZE};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Start of the last sector, used by the write test
pub const LAST_SECTOR: u32 = FLASH_SIZE - SECTOR_SIZE;

#[derive(Parser)]
#[command(name = "rvflash")]
#[command(author, version, about = "SPI flash tool for the RISC-V test SoC", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML) with [flash], [device], [controller]
    /// and [clock] tables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Preload the emulated flash from this file
    #[arg(long, global = true)]
    pub image: Option<PathBuf>,

    /// Write the emulated flash contents to this file when done
    #[arg(long, global = true)]
    pub save: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the flash manufacturer and device ID
    Readid,

    /// Read bytes from flash memory
    Read {
        /// Start address (decimal or 0x hex)
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Number of bytes (decimal or 0x hex)
        #[arg(value_parser = parse_hex_u32)]
        len: u32,

        /// Write the data to a file instead of printing a hex dump
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Erase the sector containing an address
    Erase {
        /// Any address inside the sector (decimal or 0x hex)
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,
    },

    /// Erase, program and verify a scratch sector
    Writetest {
        /// Sector to use (decimal or 0x hex)
        #[arg(long, value_parser = parse_hex_u32, default_value_t = LAST_SECTOR)]
        sector: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_hex_u32("0x7f0000"), Ok(0x7F_0000));
        assert_eq!(parse_hex_u32("0X10"), Ok(16));
        assert_eq!(parse_hex_u32("256"), Ok(256));
        assert!(parse_hex_u32("0xzz").is_err());
        assert!(parse_hex_u32("-1").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["rvflash", "-vv", "read", "0x100", "32"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Read {
                addr: 0x100,
                len: 32,
                output: None
            }
        ));

        let cli = Cli::parse_from(["rvflash", "writetest"]);
        assert!(matches!(cli.command, Commands::Writetest { sector: 0x7F_0000 }));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
