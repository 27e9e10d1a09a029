//! Fixed-size per-layer statistics store.

use thiserror::Error;

use super::record::StatsRecord;
use super::role::TensorRole;
use super::trim_name;

/// Statistics store access errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("Layer index {layer} out of range (store holds {count} layers)")]
    LayerOutOfRange { layer: usize, count: usize },
}

/// Per-layer statistics for the four tensor roles.
///
/// Sized once at creation; there is no resize. Four parallel tables, one per
/// [`TensorRole`], each `layer_count` records long. The layer name lives in
/// the output-role record.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsStore {
    tables: [Vec<StatsRecord>; 4],
    layer_count: usize,
}

impl StatisticsStore {
    /// Create a store for `layer_count` layers with sentinel-initialized records.
    pub fn new(layer_count: usize) -> Self {
        Self {
            tables: std::array::from_fn(|_| vec![StatsRecord::default(); layer_count]),
            layer_count,
        }
    }

    /// Number of layers the store was created for.
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Fold samples into the record for `layer`/`role`.
    ///
    /// An empty batch succeeds without touching the record.
    pub fn update(
        &mut self,
        layer: usize,
        role: TensorRole,
        samples: &[f32],
    ) -> Result<(), StatsError> {
        self.record_mut(layer, role)?.fold(samples);
        Ok(())
    }

    /// Store the trimmed layer name in the output-role slot.
    pub fn set_layer_name(&mut self, layer: usize, name: &str) -> Result<(), StatsError> {
        self.record_mut(layer, TensorRole::Output)?.name = trim_name(name).to_string();
        Ok(())
    }

    /// Name stored for `layer`.
    pub fn layer_name(&self, layer: usize) -> Result<&str, StatsError> {
        Ok(self.record(layer, TensorRole::Output)?.name())
    }

    /// First layer whose stored name equals the trimmed `name`.
    pub fn find_layer_by_name(&self, name: &str) -> Option<usize> {
        let wanted = trim_name(name);
        self.tables[TensorRole::Output.index()]
            .iter()
            .position(|record| record.name == wanted)
    }

    /// Stored extrema. Sentinel values when no samples were folded;
    /// callers test `max > min` before trusting them.
    pub fn min_max(&self, layer: usize, role: TensorRole) -> Result<(f32, f32), StatsError> {
        Ok(self.record(layer, role)?.min_max())
    }

    /// Mean and standard deviation, see [`StatsRecord::mean_stddev`].
    pub fn mean_stddev(&self, layer: usize, role: TensorRole) -> Result<(f32, f32), StatsError> {
        Ok(self.record(layer, role)?.mean_stddev())
    }

    /// Borrow a record.
    pub fn record(&self, layer: usize, role: TensorRole) -> Result<&StatsRecord, StatsError> {
        self.check_layer(layer)?;
        Ok(&self.tables[role.index()][layer])
    }

    /// All records, layer-major and role-minor (snapshot order).
    pub fn rows(&self) -> impl Iterator<Item = (usize, TensorRole, &StatsRecord)> + '_ {
        (0..self.layer_count).flat_map(move |layer| {
            TensorRole::ALL
                .into_iter()
                .map(move |role| (layer, role, &self.tables[role.index()][layer]))
        })
    }

    pub(crate) fn record_mut(
        &mut self,
        layer: usize,
        role: TensorRole,
    ) -> Result<&mut StatsRecord, StatsError> {
        self.check_layer(layer)?;
        Ok(&mut self.tables[role.index()][layer])
    }

    fn check_layer(&self, layer: usize) -> Result<(), StatsError> {
        if layer < self.layer_count {
            Ok(())
        } else {
            Err(StatsError::LayerOutOfRange { layer, count: self.layer_count })
        }
    }
}
