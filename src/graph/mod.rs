//! Layer graph consumed by the quantizer
//!
//! A small graph: layers with names, a kind, forward input
//! edges and optional recurrent back-edges (memory reads fed by a later
//! layer). Forward edges always form a DAG; recurrent edges are ignored by
//! the topological ordering but participate in range propagation.

mod layer;
mod network;
mod spec;


pub use layer::{Layer, LayerId, LayerKind};
pub use network::{GraphError, Network};
pub use spec::{LayerSpec, NetworkSpec};
