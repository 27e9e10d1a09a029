//! Error types for quantcal
//!
//! Each concern keeps its own `thiserror` enum (statistics, snapshots, graph);
//! this module folds them into the crate-wide [`Error`].

use thiserror::Error;

use crate::graph::GraphError;
use crate::stats::{SnapshotError, StatsError};

/// Result type alias for quantcal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the quantization pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// No scale factors were supplied at all.
    #[error("Scale factor is empty")]
    EmptyScaleFactors,

    /// Fewer scale factors than graph inputs.
    #[error("Scale factors are not set for some of the inputs: {inputs} inputs, {provided} scale factors")]
    MissingInputScales { inputs: usize, provided: usize },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Malformed graph.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Statistics store access failed.
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Calibration snapshot could not be read or written.
    #[error("Calibration snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The range worklist exceeded its step budget.
    #[error("Dynamic range propagation did not converge after {steps} steps")]
    RangeNotConverged { steps: usize },

    /// The scale-derivation sweep exceeded its restart budget.
    #[error("Scale factor derivation did not converge after {restarts} restarts")]
    ScaleNotConverged { restarts: usize },

    /// Back-propagated range disagrees with a calibrated range (strict mode only).
    #[error("Dynamic range anomaly on layer '{layer}': calibrated {calibrated}, aggregated {aggregated}")]
    RangeAnomaly {
        layer: String,
        calibrated: f32,
        aggregated: f32,
    },

    /// Layer id outside the network.
    #[error("Unknown layer id {0}")]
    UnknownLayer(usize),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error stems from caller-supplied configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyScaleFactors | Self::MissingInputScales { .. } | Self::ConfigError(_)
        )
    }
}
