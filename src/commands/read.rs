//! Read command implementation

use indicatif::{ProgressBar, ProgressStyle};
use rvflash_core::clock::CycleCounter;
use rvflash_core::controller::SpiController;
use rvflash_core::flash::SpiFlash;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Bytes per hex dump line
const LINE_SIZE: u32 = 16;

/// Chunk size for reading to a file (4 KiB)
const READ_CHUNK_SIZE: u32 = 4096;

/// Run the read command, printing a hex dump
pub fn run_read<C: SpiController, K: CycleCounter>(
    flash: &mut SpiFlash<C, K>,
    addr: u32,
    len: u32,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(out, "Reading from SPI flash:")?;

    let mut buf = [0u8; LINE_SIZE as usize];
    let mut offset = 0;
    while offset < len {
        let nbytes = (len - offset).min(LINE_SIZE);
        let line_addr = addr.wrapping_add(offset);
        let line = &mut buf[..nbytes as usize];
        flash.read_mem(line_addr, line);

        write!(out, "{:08x}:", line_addr)?;
        for byte in line.iter() {
            write!(out, " {:02x}", byte)?;
        }
        writeln!(out)?;
        offset += nbytes;
    }
    Ok(())
}

/// Run the read command, writing the data to `output`
pub fn run_read_to_file<C: SpiController, K: CycleCounter>(
    flash: &mut SpiFlash<C, K>,
    addr: u32,
    len: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_with_progress(flash, addr, len)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read `len` bytes with a progress bar
fn read_with_progress<C: SpiController, K: CycleCounter>(
    flash: &mut SpiFlash<C, K>,
    addr: u32,
    len: u32,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = vec![0u8; len as usize];

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );

    for (i, chunk) in data.chunks_mut(READ_CHUNK_SIZE as usize).enumerate() {
        let offset = i as u32 * READ_CHUNK_SIZE;
        flash.read_mem(addr.wrapping_add(offset), chunk);
        pb.set_position((offset as u64) + chunk.len() as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
