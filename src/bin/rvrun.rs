//! A thin demonstration binary: load a raw binary image and run it to
//! completion or trap. The interesting engineering lives in the library;
//! this is just enough of a driver to exercise it, grounded on the
//! teacher's `emulate` binary's argument shape, trimmed to what the core
//! actually exposes (`clear_traps`, `set_next_pc`, `run`, `trap_cause`).

use clap::Parser;
use rvcore::backends::BasicMemory;
use rvcore::core::{Fetch, Traps};
use rvcore::dispatch::{self, Extensions};
use rvcore::run::run;
use rvcore::Cpu;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

/// Run a raw RV32IMCF binary image against the reference memory backend.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a flat binary image, loaded at address 0.
    input: String,

    /// Instruction budget per `run` call.
    #[arg(short, long, default_value_t = 1_000_000)]
    budget: u32,

    /// Backing memory size in bytes.
    #[arg(short, long, default_value_t = 1 << 20)]
    memory_size: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let image = match fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("failed to read {}: {e}", args.input);
            return ExitCode::FAILURE;
        }
    };

    let mut memory = BasicMemory::new(args.memory_size);
    memory.load_image(&image);

    let mut cpu = Cpu::new(memory);
    cpu.set_next_pc(0);
    run(&mut cpu, args.budget, |cpu| {
        dispatch::step(cpu, Extensions::ALL);
    });

    let output = cpu.memory.drain_tty_output();
    if !output.is_empty() {
        io::stdout().write_all(&output).ok();
    }

    match cpu.trap_cause() {
        Some(trap) => {
            eprintln!(
                "trapped: {:?} at pc=0x{:08x}, context=0x{:08x}",
                trap.kind,
                cpu.pc(),
                trap.context
            );
            ExitCode::FAILURE
        }
        None => {
            eprintln!("budget exhausted at pc=0x{:08x}", cpu.pc());
            ExitCode::SUCCESS
        }
    }
}
