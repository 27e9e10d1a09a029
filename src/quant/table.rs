//! Side table of quantization records keyed by layer id.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::state::QuantizedLayerParams;
use crate::graph::LayerId;

/// One [`QuantizedLayerParams`] per layer, indexed by [`LayerId`].
///
/// Owned by the quantizer; the graph itself is never annotated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantTable {
    params: Vec<QuantizedLayerParams>,
}

impl QuantTable {
    /// Fresh records for `layer_count` layers.
    pub fn new(layer_count: usize) -> Self {
        Self { params: vec![QuantizedLayerParams::default(); layer_count] }
    }

    pub fn get(&self, id: LayerId) -> Option<&QuantizedLayerParams> {
        self.params.get(id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut QuantizedLayerParams> {
        self.params.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerId, &QuantizedLayerParams)> {
        self.params.iter().enumerate()
    }
}

impl Index<LayerId> for QuantTable {
    type Output = QuantizedLayerParams;

    fn index(&self, id: LayerId) -> &Self::Output {
        &self.params[id]
    }
}

impl IndexMut<LayerId> for QuantTable {
    fn index_mut(&mut self, id: LayerId) -> &mut Self::Output {
        &mut self.params[id]
    }
}
