use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sweepbench::sweep;

#[derive(Parser)]
#[command(
    name = "sweepbench",
    version,
    about = "Parameter-sweep driver for channel and latency benchmark binaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Repetitions averaged per sweep point
    #[arg(long, global = true, default_value_t = sweep::DEFAULT_REPS)]
    reps: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep a channel benchmark over delivery mode, server and client counts
    Channels {
        /// Path to the channel benchmark binary
        binary: Option<PathBuf>,
    },
    /// Sweep data-structure benchmarks over update load and core count
    Latency {
        /// Group name used in output-file names
        name: Option<String>,
        /// Paths to the benchmark binaries, one column group each
        binaries: Vec<PathBuf>,
    },
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Channels { binary: None } => {
            // Missing the target binary is a no-op, not a failure.
            eprintln!("Usage: sweepbench channels <channel binary>");
        }
        Commands::Channels {
            binary: Some(binary),
        } => {
            sweep::run_channels(&binary, cli.reps)?;
        }
        Commands::Latency { name, binaries } => match name {
            Some(name) if !binaries.is_empty() => {
                sweep::run_latency(&name, &binaries, cli.reps)?;
            }
            _ => {
                eprintln!("Usage: sweepbench latency <group name> <binaries>...");
            }
        },
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}
