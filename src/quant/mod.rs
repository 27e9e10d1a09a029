//! Fixed-point quantization state
//!
//! Per-edge scale and dynamic-range records, the derived-scale formula, and
//! the side table holding one [`QuantizedLayerParams`] per layer.

mod precision;
mod state;
mod table;
mod transform;


pub use precision::{ScaleParams, WeightPrecision};
pub use state::{Quantization, QuantizedLayerParams};
pub use table::QuantTable;
pub use transform::{transform_layer, LayerTransform};
