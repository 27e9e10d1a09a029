//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! quantcal inspect layer_statistics.txt
//! quantcal quantize graph.yaml --scale 2048
//! quantcal quantize graph.yaml --scale 2048 --scale 1024 --stats calib.txt --format json
//! ```

mod args;
mod types;

pub use args::{parse_args, Cli, Command, InspectArgs, QuantizeArgs};
pub use types::OutputFormat;

#[cfg(test)]
mod tests;
