//! Layer statistics collected during floating-point execution
//!
//! Running min/max/sum/sum-of-squares per layer and tensor role, plus the
//! `OV_GNA_PLUGIN_STATS` text snapshot used to hand the statistics from a
//! float session over to the quantizer.
//!
//! Records are joined to graph layers by trimmed name, never by position:
//! layer ordering may differ between the run that produced a snapshot and
//! the run that consumes it.

mod record;
mod role;
mod snapshot;
mod store;
mod summary;


pub use record::StatsRecord;
pub use role::TensorRole;
pub use snapshot::{SnapshotError, SNAPSHOT_MAGIC};
pub use store::{StatisticsStore, StatsError};
pub use summary::StatsSummary;

/// Characters stripped from both ends of layer names.
pub(crate) const NAME_WHITESPACE: &[char] = &[' ', '\t', '\r', '\n'];

/// Trim a layer name the way names are stored and looked up.
pub(crate) fn trim_name(name: &str) -> &str {
    name.trim_matches(NAME_WHITESPACE)
}
