use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use ls8::{
    emu::{
        emulator::{Emulator, StopReason},
        EmuError,
    },
    loader,
};
use simplelog::LevelFilter;

/// Runs an LS-8 program.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the program file (one binary byte per line, `#` comments).
    program: PathBuf,
    /// Print the CPU state before every instruction.
    #[arg(long)]
    trace: bool,
    /// Open the debug REPL before the first instruction.
    #[arg(long)]
    debug: bool,
    /// Stop after executing this many instructions.
    #[arg(long)]
    max_steps: Option<u64>,
    /// Log level filter (off, error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    #[cfg(debug_assertions)]
    let default_level = LevelFilter::Trace;
    #[cfg(not(debug_assertions))]
    let default_level = LevelFilter::Info;
    let level = if args.trace {
        LevelFilter::Trace
    } else {
        args.log_level.unwrap_or(default_level)
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let image = loader::load_file(&args.program)?;
    let mut emu = Emulator::new();
    emu.load(&image)?;
    if args.debug {
        emu.debug()?;
    }

    let reason = match args.max_steps {
        Some(max_steps) => emu.run_for(max_steps)?,
        None => emu.run()?,
    };
    match reason {
        StopReason::Halted => log::info!("halted after {} instructions", emu.steps()),
        StopReason::UnrecognizedOpcode { opcode, pc } => {
            eprintln!(
                "Terminated: {}",
                EmuError::UnrecognizedOpcode { opcode, pc }
            );
        }
        StopReason::StepLimit => {
            eprintln!("Stopped after reaching the limit of {} instructions", emu.steps());
        }
    }
    Ok(())
}
