//! Quantizer configuration loading

use std::fs;
use std::path::Path;

use super::quantizer::QuantizerConfig;
use super::validate::validate_config;
use crate::error::{Error, Result};

/// Load and validate a quantizer configuration from a YAML file
///
/// Missing keys take their default values.
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<QuantizerConfig> {
    let yaml_content = fs::read_to_string(config_path.as_ref()).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            config_path.as_ref().display(),
            e
        ))
    })?;

    parse_config(&yaml_content)
}

/// Parse and validate a quantizer configuration from YAML text
pub fn parse_config(yaml: &str) -> Result<QuantizerConfig> {
    let config: QuantizerConfig = serde_yaml::from_str(yaml)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))?;

    validate_config(&config).map_err(|e| Error::ConfigError(format!("Invalid config: {e}")))?;

    Ok(config)
}
