//! Quantcal: fixed-point calibration and scale-factor propagation
//!
//! Turns a floating-point layer graph into one annotated with per-tensor
//! fixed-point scale factors:
//!
//! - [`stats`]: running per-layer statistics and their text snapshot
//! - [`quant`]: per-edge scale and dynamic-range records
//! - [`propagate`]: range fixed point and the restartable scale sweep
//! - [`pipeline`]: the end-to-end quantizer
//! - [`runtime`]: the hook a float runtime uses to collect statistics
//!
//! # Example
//!
//! ```
//! use quantcal::config::QuantizerConfig;
//! use quantcal::graph::{LayerKind, Network};
//! use quantcal::pipeline::ModelQuantizer;
//!
//! let mut net = Network::new();
//! let input = net.add_input("in").unwrap();
//! net.add_layer("copy", LayerKind::Copy, vec![input]).unwrap();
//!
//! let mut quantizer = ModelQuantizer::new(QuantizerConfig::new().without_stats());
//! let result = quantizer.quantize_single(&net, 2048.0).unwrap();
//! assert_eq!(result.params[1].dst.scale(), 2048.0);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod propagate;
pub mod quant;
pub mod runtime;
pub mod stats;

pub use error::{Error, Result};
