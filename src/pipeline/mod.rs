//! Quantization pipeline
//!
//! End-to-end quantization of a graph:
//! 1. Copy: the caller's graph is never modified
//! 2. Seed: explicit input scales, in input declaration order
//! 3. Calibrate: seed output ranges from a statistics snapshot
//! 4. Propagate: aggregated ranges to a fixed point
//! 5. Derive: per-layer scales, restarting when a consumer caps a producer
//! 6. Quantize: integer weights and biases

mod orchestrator;
mod report;
mod stage;
mod transform;

#[cfg(test)]
mod tests;

pub use orchestrator::{ModelQuantizer, QuantizedNetwork};
pub use report::{LayerScales, QuantizationReport};
pub use stage::QuantizationStage;
pub use transform::{LayersQuantizer, QuantizedLayer, QuantizedWeights};
