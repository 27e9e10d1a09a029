//! Quantcal CLI
//!
//! # Usage
//!
//! ```bash
//! # Print a calibration snapshot
//! quantcal inspect layer_statistics.txt
//!
//! # Quantize a graph with one input scale per graph input
//! quantcal quantize graph.yaml --scale 2048
//!
//! # Use a specific snapshot and emit JSON
//! quantcal quantize graph.yaml --scale 2048 --stats calib.txt --format json
//! ```

use clap::Parser;
use quantcal::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
