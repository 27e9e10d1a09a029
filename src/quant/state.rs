//! Per-edge quantization records.

use serde::{Deserialize, Serialize};

use super::precision::ScaleParams;

/// Scale and dynamic range of one tensor edge.
///
/// Every value carries an explicit "set" flag so an unknown value is never
/// confused with zero. Flags are never cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantization {
    scale: f32,
    scale_set: bool,
    levels: i32,
    min_values: Vec<f32>,
    max_values: Vec<f32>,
    dynamic_range: f32,
    dynamic_range_set: bool,
    aggregated_dynamic_range: f32,
    aggregated_dynamic_range_set: bool,
}

impl Default for Quantization {
    fn default() -> Self {
        Self {
            scale: 1.0,
            scale_set: false,
            levels: 0,
            min_values: Vec::new(),
            max_values: Vec::new(),
            dynamic_range: 0.0,
            dynamic_range_set: false,
            aggregated_dynamic_range: 0.0,
            aggregated_dynamic_range_set: false,
        }
    }
}

impl Quantization {
    /// Set an explicit scale.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.scale_set = true;
    }

    /// Current scale, `1.0` until set.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Check if a scale was set.
    pub fn is_scale_set(&self) -> bool {
        self.scale_set
    }

    /// Record the number of quantization levels.
    pub fn set_levels(&mut self, levels: i32) {
        self.levels = levels;
    }

    /// Number of quantization levels.
    pub fn levels(&self) -> i32 {
        self.levels
    }

    /// Per-channel minima.
    pub fn set_min_values(&mut self, min: &[f32]) {
        self.min_values = min.to_vec();
    }

    pub fn min_values(&self) -> &[f32] {
        &self.min_values
    }

    /// Per-channel maxima.
    pub fn set_max_values(&mut self, max: &[f32]) {
        self.max_values = max.to_vec();
    }

    pub fn max_values(&self) -> &[f32] {
        &self.max_values
    }

    /// Overwrite the single-pass dynamic range.
    pub fn set_dynamic_range(&mut self, range: f32) {
        self.dynamic_range = range;
        self.dynamic_range_set = true;
    }

    pub fn dynamic_range(&self) -> f32 {
        self.dynamic_range
    }

    pub fn is_dynamic_range_set(&self) -> bool {
        self.dynamic_range_set
    }

    /// Overwrite the aggregated range. Reserved for authoritative sources.
    pub fn set_aggregated_dynamic_range(&mut self, range: f32) {
        self.aggregated_dynamic_range = range;
        self.aggregated_dynamic_range_set = true;
    }

    /// Max-join `range` into the aggregated range.
    ///
    /// Returns `true` when the stored value grew or was set for the first time.
    pub fn raise_aggregated_dynamic_range(&mut self, range: f32) -> bool {
        if self.aggregated_dynamic_range_set && range <= self.aggregated_dynamic_range {
            return false;
        }
        self.set_aggregated_dynamic_range(range);
        true
    }

    pub fn aggregated_dynamic_range(&self) -> f32 {
        self.aggregated_dynamic_range
    }

    pub fn is_aggregated_dynamic_range_set(&self) -> bool {
        self.aggregated_dynamic_range_set
    }

    /// Largest known range of this edge, raw or aggregated.
    pub fn known_range(&self) -> Option<f32> {
        match (self.dynamic_range_set, self.aggregated_dynamic_range_set) {
            (false, false) => None,
            (true, false) => Some(self.dynamic_range),
            (false, true) => Some(self.aggregated_dynamic_range),
            (true, true) => Some(self.dynamic_range.max(self.aggregated_dynamic_range)),
        }
    }

    /// Scale derived from the aggregated range.
    ///
    /// `max_level / ceil(range * guardband)` when an aggregated range above
    /// the minimum is available, otherwise the explicit scale, otherwise
    /// `default_scale`.
    pub fn scale_from_dynamic_range(&self, default_scale: f32, params: &ScaleParams) -> f32 {
        if self.aggregated_dynamic_range_set && self.aggregated_dynamic_range > params.min_dynamic_range {
            params.scale_for_range(self.aggregated_dynamic_range)
        } else if self.scale_set {
            self.scale
        } else {
            default_scale
        }
    }
}

/// Quantization records of one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantizedLayerParams {
    /// Input side.
    pub src: Quantization,
    /// Output side.
    pub dst: Quantization,
    /// Weight tensor.
    pub weights: Quantization,
    /// Bias tensor.
    pub bias: Quantization,
    /// Set once the final transform converted the weights.
    pub weights_quantized: bool,
}
