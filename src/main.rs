//! rvflash - SPI flash tool for the RISC-V test SoC
//!
//! Runs the boot monitor's `spiflash` commands (readid, read, writetest)
//! plus a sector erase against the emulated controller and flash from
//! `rvflash-dummy`. The emulated array can be loaded from and saved to an
//! image file, and the emulator and driver timing are set from a TOML
//! configuration file.

mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use rvflash_dummy::DummyFlash;
use std::fs;
use std::io;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };

    let device = match &cli.image {
        Some(path) => {
            let image = fs::read(path)?;
            log::info!("Loaded {} bytes from {:?}", image.len(), path);
            DummyFlash::with_data(config.device, &image)?
        }
        None => DummyFlash::new(config.device)?,
    };
    let mut flash =
        rvflash_dummy::driver_for(config.flash, device, config.controller, config.clock)?;
    flash.init();

    let mut out = io::stdout().lock();
    let result = match cli.command {
        Commands::Readid => commands::run_readid(&mut flash, &mut out),
        Commands::Read {
            addr,
            len,
            output: Some(output),
        } => commands::run_read_to_file(&mut flash, addr, len, &output),
        Commands::Read {
            addr,
            len,
            output: None,
        } => commands::run_read(&mut flash, addr, len, &mut out),
        Commands::Erase { addr } => commands::run_erase(&mut flash, addr, &mut out),
        Commands::Writetest { sector } => commands::run_writetest(&mut flash, sector, &mut out),
    };

    let violations = flash.controller().violations();
    if violations.total() > 0 {
        log::warn!("Controller protocol violations: {:?}", violations);
    }

    if let Some(path) = &cli.save {
        let data = flash.controller().flash().data();
        fs::write(path, data)?;
        log::info!("Saved {} bytes to {:?}", data.len(), path);
    }

    result
}
