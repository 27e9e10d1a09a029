//! Target precision parameters.

use serde::{Deserialize, Serialize};

/// Storage precision of quantized weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightPrecision {
    /// 8-bit weights.
    I8,
    /// 16-bit weights.
    #[default]
    I16,
}

impl WeightPrecision {
    /// Largest weight magnitude the quantizer targets.
    ///
    /// 16-bit weights keep one bit of headroom for the accumulator.
    pub fn max_weight(self) -> f32 {
        match self {
            WeightPrecision::I8 => 127.0,
            WeightPrecision::I16 => 16384.0,
        }
    }

    /// Width in bytes.
    pub fn bytes(self) -> usize {
        match self {
            WeightPrecision::I8 => 1,
            WeightPrecision::I16 => 2,
        }
    }
}

/// Parameters of the range-to-scale formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    /// Headroom multiplier applied to dynamic ranges.
    pub guardband: f32,
    /// Activation bit width; the scale targets `2^(bits-1)`.
    pub activation_bits: u8,
    /// Ranges at or below this are treated as unset.
    pub min_dynamic_range: f32,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self { guardband: 1.25, activation_bits: 16, min_dynamic_range: 1e-20 }
    }
}

impl ScaleParams {
    /// Largest representable activation magnitude, `2^(bits-1)`.
    pub fn max_level(&self) -> f32 {
        2f32.powi(i32::from(self.activation_bits) - 1)
    }

    /// Number of quantization levels, `2^bits`.
    pub fn levels(&self) -> i32 {
        1i32.checked_shl(u32::from(self.activation_bits)).unwrap_or(i32::MAX)
    }

    /// Scale mapping `range` onto the activation space with guardband.
    pub fn scale_for_range(&self, range: f32) -> f32 {
        self.max_level() / (range * self.guardband).ceil()
    }
}
