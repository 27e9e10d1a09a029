//! Quantizer configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::validate::{validate_config, ValidationError};
use crate::quant::{ScaleParams, WeightPrecision};

/// Default location of the calibration snapshot.
pub const DEFAULT_STATS_PATH: &str = "layer_statistics.txt";

/// Configuration for a quantization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizerConfig {
    /// Headroom multiplier applied to dynamic ranges.
    guardband: f32,
    /// Activation bit width.
    activation_bits: u8,
    /// Weight storage precision.
    weights_precision: WeightPrecision,
    /// Largest quantized input feature value; input ranges follow
    /// `max_input_feature_value / input_scale`.
    max_input_feature_value: f32,
    /// Ranges at or below this count as unset.
    min_dynamic_range: f32,
    /// Scale used when nothing better is known.
    default_scale: f32,
    /// Calibration snapshot to read, if any.
    stats_path: Option<PathBuf>,
    /// Layer visits allowed to the range worklist.
    max_propagation_steps: usize,
    /// Restarts allowed to the scale-derivation sweep.
    max_restarts: usize,
    /// Relative excess of a back-propagated range over a calibrated one
    /// tolerated before it is reported.
    anomaly_tolerance: f32,
    /// Turn range anomalies into errors.
    strict_ranges: bool,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            guardband: 1.25,
            activation_bits: 16,
            weights_precision: WeightPrecision::I16,
            max_input_feature_value: 16384.0,
            min_dynamic_range: 1e-20,
            default_scale: 1.0,
            stats_path: Some(PathBuf::from(DEFAULT_STATS_PATH)),
            max_propagation_steps: 100_000,
            max_restarts: 1024,
            anomaly_tolerance: 1e-3,
            strict_ranges: false,
        }
    }
}

impl QuantizerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the guardband.
    pub fn with_guardband(mut self, guardband: f32) -> Self {
        self.guardband = guardband;
        self
    }

    /// Set the activation bit width.
    pub fn with_activation_bits(mut self, bits: u8) -> Self {
        self.activation_bits = bits;
        self
    }

    /// Set the weight precision.
    pub fn with_weights_precision(mut self, precision: WeightPrecision) -> Self {
        self.weights_precision = precision;
        self
    }

    /// Set the largest input feature value.
    pub fn with_max_input_feature_value(mut self, value: f32) -> Self {
        self.max_input_feature_value = value;
        self
    }

    /// Set the minimum dynamic range.
    pub fn with_min_dynamic_range(mut self, value: f32) -> Self {
        self.min_dynamic_range = value;
        self
    }

    /// Set the default scale.
    pub fn with_default_scale(mut self, scale: f32) -> Self {
        self.default_scale = scale;
        self
    }

    /// Set the calibration snapshot path.
    pub fn with_stats_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stats_path = Some(path.into());
        self
    }

    /// Do not read any calibration snapshot.
    pub fn without_stats(mut self) -> Self {
        self.stats_path = None;
        self
    }

    /// Set the worklist step budget.
    pub fn with_max_propagation_steps(mut self, steps: usize) -> Self {
        self.max_propagation_steps = steps;
        self
    }

    /// Set the restart budget.
    pub fn with_max_restarts(mut self, restarts: usize) -> Self {
        self.max_restarts = restarts;
        self
    }

    /// Set the anomaly tolerance.
    pub fn with_anomaly_tolerance(mut self, tolerance: f32) -> Self {
        self.anomaly_tolerance = tolerance;
        self
    }

    /// Set strict range checking.
    pub fn with_strict_ranges(mut self, strict: bool) -> Self {
        self.strict_ranges = strict;
        self
    }

    pub fn guardband(&self) -> f32 {
        self.guardband
    }

    pub fn activation_bits(&self) -> u8 {
        self.activation_bits
    }

    pub fn weights_precision(&self) -> WeightPrecision {
        self.weights_precision
    }

    pub fn max_input_feature_value(&self) -> f32 {
        self.max_input_feature_value
    }

    pub fn min_dynamic_range(&self) -> f32 {
        self.min_dynamic_range
    }

    pub fn default_scale(&self) -> f32 {
        self.default_scale
    }

    pub fn stats_path(&self) -> Option<&Path> {
        self.stats_path.as_deref()
    }

    pub fn max_propagation_steps(&self) -> usize {
        self.max_propagation_steps
    }

    pub fn max_restarts(&self) -> usize {
        self.max_restarts
    }

    pub fn anomaly_tolerance(&self) -> f32 {
        self.anomaly_tolerance
    }

    pub fn strict_ranges(&self) -> bool {
        self.strict_ranges
    }

    /// Check every field is in its usable range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_config(self)
    }

    /// Parameters of the range-to-scale formula.
    pub fn scale_params(&self) -> ScaleParams {
        ScaleParams {
            guardband: self.guardband,
            activation_bits: self.activation_bits,
            min_dynamic_range: self.min_dynamic_range,
        }
    }
}
