//! Restartable per-layer scale derivation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::QuantizerConfig;
use crate::error::{Error, Result};
use crate::graph::{Layer, LayerId, LayerKind, Network};
use crate::quant::{transform_layer, LayerTransform, QuantTable, Quantization, ScaleParams, WeightPrecision};

/// Relative difference below which two scales are treated as equal.
const SCALE_TOLERANCE: f32 = 1e-6;

/// An input-scale requirement that reached a graph input.
///
/// Graph-input scales are chosen by the caller, so the sweep cannot lower
/// them; the consumer proceeds with mismatched inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleConflict {
    /// Layer whose requirement could not be met.
    pub layer: LayerId,
    /// Graph input the requirement was pushed to.
    pub input: LayerId,
    /// Scale the input would need.
    pub required: f32,
    /// Scale the input has.
    pub actual: f32,
}

/// Derives output scales layer by layer in topological order.
///
/// When a layer needs a producer to use a smaller output scale (inputs that
/// must agree, or weights that would lose precision) the producer gets a cap,
/// every layer from the producer onwards is marked unprocessed and the sweep
/// restarts there. Caps only ever tighten, and `max_restarts` bounds the
/// number of restarts.
#[derive(Debug)]
pub struct ScaleFactorCalculator<'a> {
    network: &'a Network,
    order: Vec<LayerId>,
    position: Vec<usize>,
    processed: Vec<bool>,
    caps: Vec<Option<f32>>,
    params: ScaleParams,
    default_scale: f32,
    weights_precision: WeightPrecision,
    max_restarts: usize,
    restarts: usize,
    restart_pending: bool,
    conflicts: Vec<ScaleConflict>,
}

impl<'a> ScaleFactorCalculator<'a> {
    pub fn new(network: &'a Network, config: &QuantizerConfig) -> Result<Self> {
        let order = network.topological_order()?;
        let mut position = vec![0; network.len()];
        for (pos, &id) in order.iter().enumerate() {
            position[id] = pos;
        }
        Ok(Self {
            network,
            order,
            position,
            processed: vec![false; network.len()],
            caps: vec![None; network.len()],
            params: config.scale_params(),
            default_scale: config.default_scale(),
            weights_precision: config.weights_precision(),
            max_restarts: config.max_restarts(),
            restarts: 0,
            restart_pending: false,
            conflicts: Vec::new(),
        })
    }

    /// Unprocessed layers in topological order; clears a pending restart.
    pub fn start_layers(&mut self) -> Vec<LayerId> {
        self.restart_pending = false;
        self.order
            .iter()
            .copied()
            .filter(|&id| !self.processed[id])
            .collect()
    }

    pub fn all_layers_processed(&self) -> bool {
        self.processed.iter().all(|&p| p)
    }

    /// Whether the last transform invalidated already processed layers.
    pub fn need_to_restart(&self) -> bool {
        self.restart_pending
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    pub fn conflicts(&self) -> &[ScaleConflict] {
        &self.conflicts
    }

    /// Output-scale cap placed on a layer, if any.
    pub fn cap(&self, id: LayerId) -> Option<f32> {
        self.caps.get(id).copied().flatten()
    }

    /// Sweep until every layer is processed.
    pub fn run(&mut self, table: &mut QuantTable) -> Result<()> {
        if table.len() < self.network.len() {
            return Err(Error::UnknownLayer(table.len()));
        }
        let network = self.network;
        while !self.all_layers_processed() {
            for id in self.start_layers() {
                let layer = network.layer(id).ok_or(Error::UnknownLayer(id))?;
                transform_layer(self, layer, table)?;
                if self.need_to_restart() {
                    break;
                }
            }
        }
        debug!(
            restarts = self.restarts,
            conflicts = self.conflicts.len(),
            "scale derivation finished"
        );
        Ok(())
    }

    fn range_scale(&self, quant: &Quantization) -> Option<f32> {
        (quant.is_aggregated_dynamic_range_set()
            && quant.aggregated_dynamic_range() > self.params.min_dynamic_range)
            .then(|| self.params.scale_for_range(quant.aggregated_dynamic_range()))
    }

    fn capped(&self, id: LayerId, scale: f32) -> f32 {
        self.caps[id].map_or(scale, |cap| scale.min(cap))
    }

    fn schedule_restart(&mut self) -> Result<()> {
        self.restarts += 1;
        if self.restarts > self.max_restarts {
            return Err(Error::ScaleNotConverged {
                restarts: self.max_restarts,
            });
        }
        self.restart_pending = true;
        Ok(())
    }

    /// Cap the output scale of `start`, pushing through layers that cannot
    /// rescale. Returns whether any cap was tightened.
    fn push_cap(
        &mut self,
        start: LayerId,
        cap: f32,
        consumer: LayerId,
        table: &QuantTable,
    ) -> Result<bool> {
        let network = self.network;
        let mut stack = vec![start];
        let mut visited = vec![false; network.len()];
        let mut tightened = false;

        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut visited[id], true) {
                continue;
            }
            let layer = network.layer(id).ok_or(Error::UnknownLayer(id))?;
            if layer.is_input() {
                self.record_conflict(consumer, id, cap, table[id].dst.scale());
            } else if layer.kind.can_rescale() {
                if self.caps[id].map_or(true, |existing| cap < existing) {
                    debug!(layer = %layer.name, cap, "capping output scale");
                    self.caps[id] = Some(cap);
                    let from = self.position[id];
                    for &later in &self.order[from..] {
                        self.processed[later] = false;
                    }
                    tightened = true;
                }
            } else {
                stack.extend(layer.inputs.iter().copied());
            }
        }
        Ok(tightened)
    }

    fn record_conflict(&mut self, layer: LayerId, input: LayerId, required: f32, actual: f32) {
        if self
            .conflicts
            .iter()
            .any(|c| c.layer == layer && c.input == input)
        {
            return;
        }
        warn!(layer, input, required, actual, "input scale conflict cannot be resolved");
        self.conflicts.push(ScaleConflict {
            layer,
            input,
            required,
            actual,
        });
    }

    /// Common scale of the forward inputs, `None` when a restart was scheduled.
    fn input_scale(&mut self, layer: &Layer, table: &QuantTable) -> Result<Option<f32>> {
        let scales: Vec<(LayerId, f32)> = layer
            .inputs
            .iter()
            .map(|&p| (p, table[p].dst.scale()))
            .collect();
        let Some(min) = scales.iter().map(|&(_, s)| s).reduce(f32::min) else {
            return Ok(Some(self.default_scale));
        };

        if layer.kind.requires_uniform_input_scale() {
            let mut tightened = false;
            for &(p, s) in &scales {
                if s - min > SCALE_TOLERANCE * s {
                    tightened |= self.push_cap(p, min, layer.id, table)?;
                }
            }
            if tightened {
                self.schedule_restart()?;
                return Ok(None);
            }
        }
        Ok(Some(min))
    }

    /// Weight scale and output scale of a weighted layer.
    fn weighted(&mut self, layer: &Layer, input_scale: f32, table: &mut QuantTable) -> Result<Option<f32>> {
        let id = layer.id;
        let max_abs = layer.max_abs_weight();
        let mut weight_scale = if max_abs > 0.0 {
            self.weights_precision.max_weight() / max_abs
        } else {
            1.0
        };
        let mut out = input_scale * weight_scale;

        let limit = [self.range_scale(&table[id].dst), self.caps[id]]
            .into_iter()
            .flatten()
            .reduce(f32::min);
        if let Some(limit) = limit.filter(|&limit| out > limit) {
            let needed = limit / input_scale;
            if needed < 1.0 {
                // input too fine for the weights, ask producers for a coarser scale
                let mut tightened = false;
                for &p in &layer.inputs {
                    tightened |= self.push_cap(p, limit, id, table)?;
                }
                if tightened {
                    self.schedule_restart()?;
                    return Ok(None);
                }
            }
            weight_scale = needed;
            out = limit;
        }

        let params = &mut table[id];
        params.weights.set_scale(weight_scale);
        params.bias.set_scale(out);
        Ok(Some(out))
    }
}

impl LayerTransform for ScaleFactorCalculator<'_> {
    fn transform(&mut self, layer: &Layer, table: &mut QuantTable) -> Result<()> {
        let id = layer.id;
        let out = match layer.kind {
            LayerKind::Input => {
                let src = &mut table[id].src;
                if !src.is_scale_set() {
                    src.set_scale(self.default_scale);
                }
                src.scale()
            }
            LayerKind::Memory => {
                let out = self.capped(id, self.range_scale(&table[id].dst).unwrap_or(self.default_scale));
                table[id].src.set_scale(out);
                out
            }
            kind => {
                let Some(input_scale) = self.input_scale(layer, table)? else {
                    return Ok(());
                };
                let out = if kind.has_weights() {
                    match self.weighted(layer, input_scale, table)? {
                        Some(out) => out,
                        None => return Ok(()),
                    }
                } else {
                    match kind {
                        // an earlier sweep may have set dst.scale; only the range counts here
                        LayerKind::Activation => self.range_scale(&table[id].dst).unwrap_or(input_scale),
                        LayerKind::Eltwise => self
                            .range_scale(&table[id].dst)
                            .map_or(input_scale, |range| input_scale.min(range)),
                        _ => input_scale,
                    }
                };
                table[id].src.set_scale(input_scale);
                self.capped(id, out)
            }
        };
        table[id].dst.set_scale(out);
        self.processed[id] = true;
        Ok(())
    }
}
