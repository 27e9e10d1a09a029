//! Per-layer transform hook.

use super::table::QuantTable;
use crate::error::{Error, Result};
use crate::graph::Layer;

/// A pass that visits one layer at a time and updates its quantization
/// records.
///
/// Implemented by the scale-derivation sweep and by the final weight
/// conversion; both are driven layer by layer in topological order.
pub trait LayerTransform {
    fn transform(&mut self, layer: &Layer, table: &mut QuantTable) -> Result<()>;
}

/// Apply `transform` to `layer`.
///
/// Fails with [`Error::UnknownLayer`] when the table has no record for the
/// layer, so implementations may index the table by the layer's own id.
pub fn transform_layer<T: LayerTransform + ?Sized>(
    transform: &mut T,
    layer: &Layer,
    table: &mut QuantTable,
) -> Result<()> {
    if layer.id >= table.len() {
        return Err(Error::UnknownLayer(layer.id));
    }
    transform.transform(layer, table)
}
