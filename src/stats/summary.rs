//! Printable summary of a statistics store.

use std::fmt;

use super::store::StatisticsStore;

/// Tabular view over a [`StatisticsStore`], one row per layer and role.
#[derive(Debug, Clone, Copy)]
pub struct StatsSummary<'a> {
    store: &'a StatisticsStore,
}

impl<'a> StatsSummary<'a> {
    /// Wrap a store for display.
    pub fn new(store: &'a StatisticsStore) -> Self {
        Self { store }
    }
}

impl StatisticsStore {
    /// Display adapter printing every record as a table row.
    pub fn summary(&self) -> StatsSummary<'_> {
        StatsSummary::new(self)
    }
}

impl fmt::Display for StatsSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Id\tType\tMin\tMax\tMean\tStd dev\tIR op name")?;
        for (layer, role, record) in self.store.rows() {
            let (min, max) = record.min_max();
            let (mean, std_dev) = record.mean_stddev();
            let name = self.store.layer_name(layer).unwrap_or_default();
            writeln!(
                f,
                "{layer:4}\t{}\t{min:8.5}\t{max:8.5}\t{mean:8.5}\t{std_dev:8.5}\t{name}",
                role.tag(),
            )?;
        }
        Ok(())
    }
}
