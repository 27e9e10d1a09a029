//! Quantization report
//!
//! Summarizes the scales chosen for every layer together with what the
//! propagation passes observed on the way.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{LayerId, LayerKind, Network};
use crate::propagate::{RangeAnomaly, ScaleConflict};
use crate::quant::QuantTable;

/// Scales chosen for one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerScales {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub input_scale: f32,
    pub output_scale: f32,
    /// Weight scale of weighted layers.
    pub weight_scale: Option<f32>,
    /// Aggregated output range, when one was established.
    pub output_range: Option<f32>,
}

/// Summary of a quantization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantizationReport {
    pub layers: Vec<LayerScales>,
    /// Whether calibration statistics were applied.
    pub calibrated: bool,
    /// Layers whose output range came from calibration.
    pub seeded_layers: usize,
    /// Worklist steps of range propagation.
    pub propagation_steps: usize,
    /// Restarts of the scale-derivation sweep.
    pub restarts: usize,
    pub anomalies: Vec<RangeAnomaly>,
    pub conflicts: Vec<ScaleConflict>,
}

impl QuantizationReport {
    /// Collect the per-layer scales from a finished table.
    pub fn collect_layers(network: &Network, table: &QuantTable) -> Vec<LayerScales> {
        network
            .layers()
            .iter()
            .zip(table.iter())
            .map(|(layer, (_, params))| LayerScales {
                id: layer.id,
                name: layer.name.clone(),
                kind: layer.kind,
                input_scale: params.src.scale(),
                output_scale: params.dst.scale(),
                weight_scale: layer.kind.has_weights().then(|| params.weights.scale()),
                output_range: params
                    .dst
                    .is_aggregated_dynamic_range_set()
                    .then(|| params.dst.aggregated_dynamic_range()),
            })
            .collect()
    }

    /// Find the scales of a layer by name.
    pub fn layer(&self, name: &str) -> Option<&LayerScales> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for QuantizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.calibrated {
            writeln!(
                f,
                "Calibration: {} layers seeded, {} propagation steps",
                self.seeded_layers, self.propagation_steps
            )?;
        } else {
            writeln!(f, "Calibration: none")?;
        }
        writeln!(f, "Restarts: {}", self.restarts)?;
        writeln!(f, "Id\tKind\tIn scale\tOut scale\tWeight scale\tRange\tName")?;
        for layer in &self.layers {
            let weight = layer
                .weight_scale
                .map_or_else(|| "-".to_string(), |s| format!("{s:.4}"));
            let range = layer
                .output_range
                .map_or_else(|| "-".to_string(), |r| format!("{r:.4}"));
            writeln!(
                f,
                "{:4}\t{}\t{:.4}\t{:.4}\t{}\t{}\t{}",
                layer.id,
                layer.kind.as_str(),
                layer.input_scale,
                layer.output_scale,
                weight,
                range,
                layer.name
            )?;
        }
        for anomaly in &self.anomalies {
            writeln!(
                f,
                "warning: layer '{}' range {:.4} exceeds calibrated {:.4}",
                anomaly.name, anomaly.aggregated, anomaly.calibrated
            )?;
        }
        for conflict in &self.conflicts {
            writeln!(
                f,
                "warning: layer {} needs input {} at scale {:.4}, has {:.4}",
                conflict.layer, conflict.input, conflict.required, conflict.actual
            )?;
        }
        Ok(())
    }
}
