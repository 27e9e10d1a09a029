//! Quantizer configuration and command-line arguments
//!
//! Configuration is read from YAML with `serde_yaml`; every key is optional
//! and falls back to its default.

mod cli;
mod loader;
mod quantizer;
pub mod validate;

pub use cli::{parse_args, Cli, Command, InspectArgs, OutputFormat, QuantizeArgs};
pub use loader::{load_config, parse_config};
pub use quantizer::{QuantizerConfig, DEFAULT_STATS_PATH};
pub use validate::{validate_config, ValidationError};
