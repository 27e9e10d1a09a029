//! Quantize command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, OutputFormat, QuantizeArgs, QuantizerConfig};
use crate::graph::NetworkSpec;
use crate::pipeline::ModelQuantizer;

/// Build the quantizer configuration from the config file and overrides.
fn resolve_config(args: &QuantizeArgs) -> Result<QuantizerConfig, String> {
    let config = match &args.config {
        Some(path) => load_config(path).map_err(|e| e.to_string())?,
        None => QuantizerConfig::default(),
    };
    Ok(match &args.stats {
        Some(stats) => config.with_stats_path(stats),
        None => config,
    })
}

pub fn run_quantize(args: QuantizeArgs, level: LogLevel) -> Result<(), String> {
    let config = resolve_config(&args)?;

    let network = NetworkSpec::load(&args.graph)
        .and_then(|spec| Ok(spec.build()?))
        .map_err(|e| format!("Failed to load graph {}: {e}", args.graph.display()))?;

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Quantizing {} ({} layers, {} inputs)",
            args.graph.display(),
            network.len(),
            network.input_ids().len()
        ),
    );

    let mut quantizer = ModelQuantizer::new(config);
    let result = quantizer
        .quantize(&network, &args.scales)
        .map_err(|e| format!("Quantization failed: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, result.report.to_string().trim_end());
        }
        OutputFormat::Json => {
            let json = result
                .report
                .to_json()
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
    }

    Ok(())
}
