//! Scale-factor propagation
//!
//! Two passes run after calibration has been seeded:
//!
//! 1. [`RangePropagator`] drives aggregated dynamic ranges to a fixed point
//!    with a worklist. Ranges flow forward through pass-through layers and
//!    back into producers, so every producer of a fan-in ends up with the
//!    largest range any sibling needs.
//! 2. [`ScaleFactorCalculator`] derives output scales in topological order,
//!    restarting from an earlier layer whenever a consumer forces a producer
//!    to lower its scale.

mod policy;
mod ranges;
mod scale;


pub use policy::{LayerKindPolicy, RangePolicy};
pub use ranges::{PropagationReport, RangeAnomaly, RangePropagator};
pub use scale::{ScaleConflict, ScaleFactorCalculator};
