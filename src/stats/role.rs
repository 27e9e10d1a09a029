//! Tensor roles tracked per layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tensor of a layer a statistics record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TensorRole {
    /// Layer input activations.
    Input,
    /// Layer output activations. Also holds the layer name.
    Output,
    /// Weight tensor.
    Weight,
    /// Bias tensor.
    Bias,
}

impl TensorRole {
    /// All roles in snapshot order.
    pub const ALL: [TensorRole; 4] = [
        TensorRole::Input,
        TensorRole::Output,
        TensorRole::Weight,
        TensorRole::Bias,
    ];

    /// Position of this role's table.
    pub fn index(self) -> usize {
        match self {
            TensorRole::Input => 0,
            TensorRole::Output => 1,
            TensorRole::Weight => 2,
            TensorRole::Bias => 3,
        }
    }

    /// Single-character tag used in snapshots.
    pub fn tag(self) -> char {
        match self {
            TensorRole::Input => 'I',
            TensorRole::Output => 'O',
            TensorRole::Weight => 'W',
            TensorRole::Bias => 'B',
        }
    }

    /// Parse a snapshot tag. Unknown tags yield `None`.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'I' => Some(TensorRole::Input),
            'O' => Some(TensorRole::Output),
            'W' => Some(TensorRole::Weight),
            'B' => Some(TensorRole::Bias),
            _ => None,
        }
    }
}

impl fmt::Display for TensorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
