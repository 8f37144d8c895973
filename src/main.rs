//! LC-3 Emulator - CLI entry point.
//!
//! Loads one or more flat binary images into the shared address space
//! (later images win on overlap) and runs from the architecture entry
//! address 0x3000 until TRAP HALT.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use lc3::{Cpu, CpuError, RawModeGuard, TerminalKeyboard};

#[derive(Parser)]
#[command(name = "lc3-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for the LC-3 teaching computer architecture")]
struct Cli {
    /// Program image files, loaded into memory in argument order
    #[arg(required = true, value_name = "IMAGE")]
    images: Vec<PathBuf>,

    /// Stop after this many instructions instead of running to HALT
    #[arg(short, long)]
    max_cycles: Option<u64>,
}

fn main() {
    let cli = Cli::parse();

    let mut cpu = Cpu::new(TerminalKeyboard::new(), std::io::stdout());

    for path in &cli.images {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("failed to load image {}: {}", path.display(), e);
                process::exit(1);
            }
        };
        if let Err(e) = cpu.load_image(&bytes) {
            eprintln!("failed to load image {}: {}", path.display(), e);
            process::exit(1);
        }
    }

    // Raw mode makes single keystrokes visible to the emulator without
    // line buffering or local echo. The guard restores the terminal on
    // every exit path, the interrupt one included.
    let raw = match RawModeGuard::enable() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: could not enable raw terminal mode: {}", e);
            None
        }
    };

    let result = match cli.max_cycles {
        Some(limit) => cpu.run_limited(limit),
        None => cpu.run(),
    };

    drop(raw);

    match result {
        Ok(_) => {}
        Err(CpuError::Io(e)) if e.kind() == ErrorKind::Interrupted => {
            println!();
            process::exit(130);
        }
        Err(e) => {
            eprintln!("emulator error at PC=0x{:04X}: {}", cpu.regs.pc, e);
            process::exit(1);
        }
    }
}
