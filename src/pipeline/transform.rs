//! Final weight and bias conversion.

use serde::{Deserialize, Serialize};

use crate::config::QuantizerConfig;
use crate::error::Result;
use crate::graph::{Layer, LayerId, LayerKind};
use crate::quant::{LayerTransform, QuantTable, WeightPrecision};

/// Integer weights at the target precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantizedWeights {
    I8(Vec<i8>),
    I16(Vec<i16>),
}

impl QuantizedWeights {
    pub fn len(&self) -> usize {
        match self {
            QuantizedWeights::I8(w) => w.len(),
            QuantizedWeights::I16(w) => w.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widened copy of the values.
    pub fn to_i32(&self) -> Vec<i32> {
        match self {
            QuantizedWeights::I8(w) => w.iter().map(|&v| i32::from(v)).collect(),
            QuantizedWeights::I16(w) => w.iter().map(|&v| i32::from(v)).collect(),
        }
    }
}

/// Integer parameters of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedLayer {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub weights: Option<QuantizedWeights>,
    pub biases: Option<Vec<i32>>,
}

/// Converts weights and biases with the scales chosen by the sweep.
///
/// Values are multiplied by their scale, rounded to nearest and saturated at
/// the target type's bounds.
#[derive(Debug, Clone)]
pub struct LayersQuantizer {
    precision: WeightPrecision,
    activation_levels: i32,
    layers: Vec<QuantizedLayer>,
}

impl LayersQuantizer {
    pub fn new(config: &QuantizerConfig) -> Self {
        Self {
            precision: config.weights_precision(),
            activation_levels: config.scale_params().levels(),
            layers: Vec::new(),
        }
    }

    /// Layers converted so far, in visiting order.
    pub fn layers(&self) -> &[QuantizedLayer] {
        &self.layers
    }

    pub fn into_layers(self) -> Vec<QuantizedLayer> {
        self.layers
    }

    fn quantize_weights(&self, weights: &[f32], scale: f32) -> QuantizedWeights {
        match self.precision {
            WeightPrecision::I8 => QuantizedWeights::I8(
                weights
                    .iter()
                    .map(|&w| saturate(w, scale, f32::from(i8::MIN), f32::from(i8::MAX)) as i8)
                    .collect(),
            ),
            WeightPrecision::I16 => QuantizedWeights::I16(
                weights
                    .iter()
                    .map(|&w| saturate(w, scale, f32::from(i16::MIN), f32::from(i16::MAX)) as i16)
                    .collect(),
            ),
        }
    }
}

/// `value * scale`, rounded and clamped to `[min, max]`.
fn saturate(value: f32, scale: f32, min: f32, max: f32) -> f32 {
    (value * scale).round().clamp(min, max)
}

fn quantize_bias(bias: f32, scale: f32) -> i32 {
    let scaled = (f64::from(bias) * f64::from(scale)).round();
    scaled.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

impl LayerTransform for LayersQuantizer {
    fn transform(&mut self, layer: &Layer, table: &mut QuantTable) -> Result<()> {
        let params = &mut table[layer.id];
        params.src.set_levels(self.activation_levels);
        params.dst.set_levels(self.activation_levels);

        let weights = match layer.weights.as_deref() {
            Some(w) if layer.kind.has_weights() => {
                let (min, max) = w
                    .iter()
                    .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
                if !w.is_empty() {
                    params.weights.set_min_values(&[min]);
                    params.weights.set_max_values(&[max]);
                }
                params.weights.set_levels(1 << (8 * self.precision.bytes()));
                params.weights_quantized = true;
                Some(self.quantize_weights(w, params.weights.scale()))
            }
            _ => None,
        };

        let biases = layer.biases.as_deref().map(|b| {
            let scale = params.bias.scale();
            b.iter().map(|&v| quantize_bias(v, scale)).collect::<Vec<_>>()
        });

        self.layers.push(QuantizedLayer {
            id: layer.id,
            name: layer.name.clone(),
            kind: layer.kind,
            weights,
            biases,
        });
        Ok(())
    }
}
