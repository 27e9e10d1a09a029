//! Dynamic-range policy.

use crate::graph::Layer;

/// Decides whether a layer can produce values outside the range of its
/// inputs.
///
/// Pass-through layers forward the aggregated range of their inputs to their
/// output; range-altering layers only constrain their input side and leave
/// the output to their own calibration.
pub trait RangePolicy {
    fn alters_dynamic_range(&self, layer: &Layer) -> bool;
}

/// Policy driven by [`crate::graph::LayerKind::alters_dynamic_range`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerKindPolicy;

impl RangePolicy for LayerKindPolicy {
    fn alters_dynamic_range(&self, layer: &Layer) -> bool {
        layer.kind.alters_dynamic_range()
    }
}

impl<F> RangePolicy for F
where
    F: Fn(&Layer) -> bool,
{
    fn alters_dynamic_range(&self, layer: &Layer) -> bool {
        self(layer)
    }
}
