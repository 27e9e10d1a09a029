//! Aggregated dynamic-range propagation.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::policy::{LayerKindPolicy, RangePolicy};
use crate::config::QuantizerConfig;
use crate::error::{Error, Result};
use crate::graph::{Layer, LayerId, Network};
use crate::quant::QuantTable;
use crate::stats::{StatisticsStore, TensorRole};

/// A layer whose back-propagated output range exceeds its calibrated one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeAnomaly {
    pub layer: LayerId,
    pub name: String,
    /// Range observed during calibration.
    pub calibrated: f32,
    /// Range after propagation.
    pub aggregated: f32,
}

/// Outcome of a converged propagation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropagationReport {
    /// Layer visits until the worklist drained.
    pub steps: usize,
    pub anomalies: Vec<RangeAnomaly>,
}

/// Worklist fixed point over aggregated dynamic ranges.
///
/// Aggregated ranges only grow (max-join), so every layer is re-queued a
/// bounded number of times; `max_steps` turns a runaway into
/// [`Error::RangeNotConverged`].
#[derive(Debug, Clone)]
pub struct RangePropagator<P = LayerKindPolicy> {
    policy: P,
    max_steps: usize,
    max_input_feature_value: f32,
    anomaly_tolerance: f32,
    strict: bool,
}

impl Default for RangePropagator {
    fn default() -> Self {
        Self::new()
    }
}

impl RangePropagator {
    /// Propagator with the default policy and default limits.
    pub fn new() -> Self {
        Self::from_config(&QuantizerConfig::default())
    }

    /// Propagator with the default policy and the limits of `config`.
    pub fn from_config(config: &QuantizerConfig) -> Self {
        Self {
            policy: LayerKindPolicy,
            max_steps: config.max_propagation_steps(),
            max_input_feature_value: config.max_input_feature_value(),
            anomaly_tolerance: config.anomaly_tolerance(),
            strict: config.strict_ranges(),
        }
    }
}

impl<P: RangePolicy> RangePropagator<P> {
    /// Replace the range policy.
    pub fn with_policy<Q: RangePolicy>(self, policy: Q) -> RangePropagator<Q> {
        RangePropagator {
            policy,
            max_steps: self.max_steps,
            max_input_feature_value: self.max_input_feature_value,
            anomaly_tolerance: self.anomaly_tolerance,
            strict: self.strict,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Seed output ranges from calibration.
    ///
    /// Layers are matched by trimmed name. A record whose `max` does not
    /// exceed its `min` carries no range and is skipped. Returns the number
    /// of seeded layers.
    pub fn seed_from_calibration(
        &self,
        network: &Network,
        table: &mut QuantTable,
        store: &StatisticsStore,
    ) -> Result<usize> {
        let mut seeded = 0;
        for layer in network.layers() {
            let Some(index) = store.find_layer_by_name(&layer.name) else {
                continue;
            };
            let (min, max) = store.min_max(index, TensorRole::Output)?;
            if max <= min {
                continue;
            }
            let params = table.get_mut(layer.id).ok_or(Error::UnknownLayer(layer.id))?;
            params.dst.set_dynamic_range(min.abs().max(max.abs()));
            seeded += 1;
        }
        debug!(seeded, layers = network.len(), "seeded ranges from calibration");
        Ok(seeded)
    }

    /// Pin graph-input ranges to `max_input_feature_value / scale`.
    ///
    /// Applies to every input with an explicit input scale and overrides any
    /// calibrated value.
    pub fn normalize_input_ranges(&self, network: &Network, table: &mut QuantTable) -> Result<()> {
        for &id in network.input_ids() {
            let params = table.get_mut(id).ok_or(Error::UnknownLayer(id))?;
            if !params.src.is_scale_set() {
                continue;
            }
            let range = self.max_input_feature_value / params.src.scale();
            params.src.set_dynamic_range(range);
            params.src.set_aggregated_dynamic_range(range);
            params.dst.set_dynamic_range(range);
            params.dst.set_aggregated_dynamic_range(range);
        }
        Ok(())
    }

    /// Propagate aggregated ranges until nothing changes.
    pub fn propagate(&self, network: &Network, table: &mut QuantTable) -> Result<PropagationReport> {
        if table.len() < network.len() {
            return Err(Error::UnknownLayer(table.len()));
        }
        let order = network.topological_order()?;
        let successors = network.successor_lists();

        let mut queued = vec![true; network.len()];
        let mut queue: VecDeque<LayerId> = order.into();
        let mut steps = 0;

        while let Some(id) = queue.pop_front() {
            queued[id] = false;
            steps += 1;
            if steps > self.max_steps {
                return Err(Error::RangeNotConverged {
                    steps: self.max_steps,
                });
            }

            let layer = network.layer(id).ok_or(Error::UnknownLayer(id))?;
            for changed in self.visit(layer, table) {
                for next in std::iter::once(changed).chain(successors[changed].iter().copied()) {
                    if !queued[next] {
                        queued[next] = true;
                        queue.push_back(next);
                    }
                }
            }
        }

        let anomalies = self.find_anomalies(network, table);
        for anomaly in &anomalies {
            warn!(
                layer = %anomaly.name,
                calibrated = anomaly.calibrated,
                aggregated = anomaly.aggregated,
                "back-propagated range exceeds calibrated range"
            );
        }
        if self.strict {
            if let Some(first) = anomalies.first() {
                return Err(Error::RangeAnomaly {
                    layer: first.name.clone(),
                    calibrated: first.calibrated,
                    aggregated: first.aggregated,
                });
            }
        }

        debug!(steps, anomalies = anomalies.len(), "range propagation converged");
        Ok(PropagationReport { steps, anomalies })
    }

    /// Update one layer and its producers; returns every layer that changed.
    fn visit(&self, layer: &Layer, table: &mut QuantTable) -> Vec<LayerId> {
        let predecessors: Vec<LayerId> = layer.predecessors().collect();
        let Some(mut candidate) = predecessors
            .iter()
            .filter_map(|&p| table[p].dst.known_range())
            .reduce(f32::max)
        else {
            return Vec::new();
        };

        let mut changed = Vec::new();
        let params = &mut table[layer.id];
        let grew = if self.policy.alters_dynamic_range(layer) {
            params.src.raise_aggregated_dynamic_range(candidate)
        } else {
            for side in [&params.src, &params.dst] {
                if side.is_aggregated_dynamic_range_set() {
                    candidate = candidate.max(side.aggregated_dynamic_range());
                }
            }
            let src = params.src.raise_aggregated_dynamic_range(candidate);
            let dst = params.dst.raise_aggregated_dynamic_range(candidate);
            src || dst
        };
        if grew {
            changed.push(layer.id);
        }

        if candidate > 0.0 {
            for p in predecessors {
                if table[p].dst.raise_aggregated_dynamic_range(candidate) {
                    changed.push(p);
                }
            }
        }
        changed
    }

    fn find_anomalies(&self, network: &Network, table: &QuantTable) -> Vec<RangeAnomaly> {
        network
            .layers()
            .iter()
            .filter_map(|layer| {
                let dst = &table[layer.id].dst;
                if !dst.is_dynamic_range_set() || !dst.is_aggregated_dynamic_range_set() {
                    return None;
                }
                let calibrated = dst.dynamic_range();
                let aggregated = dst.aggregated_dynamic_range();
                (aggregated > calibrated * (1.0 + self.anomaly_tolerance)).then(|| RangeAnomaly {
                    layer: layer.id,
                    name: layer.name.clone(),
                    calibrated,
                    aggregated,
                })
            })
            .collect()
    }
}
