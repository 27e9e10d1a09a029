//! Layer descriptors.

use serde::{Deserialize, Serialize};

/// Index of a layer inside its [`super::Network`].
pub type LayerId = usize;

/// Operation performed by a layer, as far as quantization cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Graph input.
    Input,
    /// Fully connected (affine) transform.
    Affine,
    /// Diagonal (per-element scale and shift) transform.
    Diagonal,
    /// 1-D convolution.
    Convolution,
    /// Max pooling.
    Pooling,
    /// Piecewise-linear activation.
    Activation,
    /// Element-wise sum or product of its inputs.
    Eltwise,
    /// Concatenation of its inputs.
    Concat,
    /// Split of its input.
    Split,
    /// Shape change only.
    Reshape,
    /// Interleave/deinterleave.
    Transpose,
    /// Copy.
    Copy,
    /// Read of recurrent state written by a later layer.
    Memory,
}

impl LayerKind {
    /// Layers carrying a weight tensor.
    pub fn has_weights(self) -> bool {
        matches!(self, LayerKind::Affine | LayerKind::Diagonal | LayerKind::Convolution)
    }

    /// Whether the layer can produce values outside its input range.
    ///
    /// Layers that only move or select values (reshape, copy, concat,
    /// pooling, memory) keep the range of their inputs.
    pub fn alters_dynamic_range(self) -> bool {
        matches!(
            self,
            LayerKind::Affine
                | LayerKind::Diagonal
                | LayerKind::Convolution
                | LayerKind::Activation
                | LayerKind::Eltwise
        )
    }

    /// Whether the layer chooses its own output scale.
    ///
    /// Memory reads take the scale of their stored range rather than
    /// inheriting one from a producer.
    pub fn can_rescale(self) -> bool {
        self.alters_dynamic_range() || self == LayerKind::Memory
    }

    /// Whether all inputs must arrive at the same scale.
    pub fn requires_uniform_input_scale(self) -> bool {
        !matches!(self, LayerKind::Eltwise | LayerKind::Input)
    }

    /// Lower-case name used in descriptions and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Input => "input",
            LayerKind::Affine => "affine",
            LayerKind::Diagonal => "diagonal",
            LayerKind::Convolution => "convolution",
            LayerKind::Pooling => "pooling",
            LayerKind::Activation => "activation",
            LayerKind::Eltwise => "eltwise",
            LayerKind::Concat => "concat",
            LayerKind::Split => "split",
            LayerKind::Reshape => "reshape",
            LayerKind::Transpose => "transpose",
            LayerKind::Copy => "copy",
            LayerKind::Memory => "memory",
        }
    }
}

/// A layer of the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Position in the network.
    pub id: LayerId,
    /// Stable name, used to join calibration statistics.
    pub name: String,
    /// Operation kind.
    pub kind: LayerKind,
    /// Forward input edges (producers).
    pub inputs: Vec<LayerId>,
    /// Recurrent back-edges: producers executed later in the same step.
    pub recurrent_inputs: Vec<LayerId>,
    /// Weights of affine/diagonal/convolution layers.
    pub weights: Option<Vec<f32>>,
    /// Biases of weighted layers.
    pub biases: Option<Vec<f32>>,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: impl Into<String>, kind: LayerKind, inputs: Vec<LayerId>) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            inputs,
            recurrent_inputs: Vec::new(),
            weights: None,
            biases: None,
        }
    }

    /// All producers, forward and recurrent.
    pub fn predecessors(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.inputs.iter().chain(self.recurrent_inputs.iter()).copied()
    }

    /// Check if the layer is a graph input.
    pub fn is_input(&self) -> bool {
        self.kind == LayerKind::Input
    }

    /// Largest weight magnitude, `0.0` without weights.
    pub fn max_abs_weight(&self) -> f32 {
        self.weights
            .as_deref()
            .unwrap_or_default()
            .iter()
            .fold(0.0f32, |acc, w| acc.max(w.abs()))
    }
}
