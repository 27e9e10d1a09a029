//! CLI argument types - Cli, Command, and argument structs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::types::OutputFormat;

/// Quantcal: fixed-point calibration and scale propagation
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "quantcal")]
#[command(version)]
#[command(about = "Derive fixed-point scale factors from calibration statistics")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the contents of a calibration snapshot
    Inspect(InspectArgs),

    /// Quantize a graph description
    Quantize(QuantizeArgs),
}

/// Arguments for the inspect command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InspectArgs {
    /// Path to the calibration snapshot
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}

/// Arguments for the quantize command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct QuantizeArgs {
    /// Path to the YAML graph description
    #[arg(value_name = "GRAPH")]
    pub graph: PathBuf,

    /// Input scale factors, one per graph input in declaration order
    #[arg(short, long = "scale", value_name = "SCALE")]
    pub scales: Vec<f32>,

    /// Override the calibration snapshot path
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Quantizer configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
