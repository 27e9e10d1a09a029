//! Quantization pipeline orchestrator
//!
//! Runs a full quantization call: graph copy, input seeding, calibration,
//! range propagation, scale derivation and weight conversion.

use tracing::{debug, info, warn};

use super::report::QuantizationReport;
use super::stage::QuantizationStage;
use super::transform::{LayersQuantizer, QuantizedLayer};
use crate::config::QuantizerConfig;
use crate::error::{Error, Result};
use crate::graph::Network;
use crate::propagate::{PropagationReport, RangePropagator, ScaleFactorCalculator};
use crate::quant::{transform_layer, QuantTable};
use crate::stats::StatisticsStore;

/// Result of a successful quantization.
#[derive(Debug, Clone)]
pub struct QuantizedNetwork {
    /// Copy of the input graph; the caller's graph is never touched.
    pub network: Network,
    /// Quantization records, one per layer.
    pub params: QuantTable,
    /// Integer weights and biases, in topological order.
    pub layers: Vec<QuantizedLayer>,
    pub report: QuantizationReport,
}

impl QuantizedNetwork {
    /// Find the integer parameters of a layer by name.
    pub fn layer(&self, name: &str) -> Option<&QuantizedLayer> {
        self.layers.iter().find(|l| l.name == name)
    }
}

/// Where calibration statistics come from.
enum Calibration {
    /// Read `stats_path` of the configuration.
    FromConfig,
    /// Supplied by the caller; `None` skips calibration.
    Provided(Option<StatisticsStore>),
}

/// Quantization pipeline orchestrator.
///
/// Tracks the stage of the current call and keeps the last error message.
#[derive(Debug, Clone)]
pub struct ModelQuantizer {
    /// Configuration.
    config: QuantizerConfig,
    /// Current stage.
    stage: QuantizationStage,
    /// Error message if failed.
    error: Option<String>,
}

impl ModelQuantizer {
    /// Create a new quantizer with the given configuration.
    pub fn new(config: QuantizerConfig) -> Self {
        Self {
            config,
            stage: QuantizationStage::Idle,
            error: None,
        }
    }

    /// Get the current stage.
    pub fn stage(&self) -> QuantizationStage {
        self.stage
    }

    /// Get the configuration.
    pub fn config(&self) -> &QuantizerConfig {
        &self.config
    }

    /// Get the error message if failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Check if the pipeline succeeded.
    pub fn succeeded(&self) -> bool {
        self.stage == QuantizationStage::Complete
    }

    /// Check if the pipeline failed.
    pub fn failed(&self) -> bool {
        self.stage == QuantizationStage::Failed
    }

    /// Reset the pipeline to idle state.
    pub fn reset(&mut self) {
        self.stage = QuantizationStage::Idle;
        self.error = None;
    }

    /// Quantize `network` with one scale per graph input.
    ///
    /// Calibration is read from the configured `stats_path`; a missing or
    /// unreadable snapshot means no calibration.
    pub fn quantize(&mut self, network: &Network, scales: &[f32]) -> Result<QuantizedNetwork> {
        self.run(network, scales, Calibration::FromConfig, |_, _| Ok(()))
    }

    /// Quantize a single-input network.
    pub fn quantize_single(&mut self, network: &Network, scale: f32) -> Result<QuantizedNetwork> {
        self.quantize(network, &[scale])
    }

    /// Quantize with caller-supplied calibration instead of the snapshot file.
    pub fn quantize_with_stats(
        &mut self,
        network: &Network,
        scales: &[f32],
        stats: Option<StatisticsStore>,
    ) -> Result<QuantizedNetwork> {
        self.run(network, scales, Calibration::Provided(stats), |_, _| Ok(()))
    }

    /// Quantize, letting `callback` inspect or rewrite the copied graph first.
    ///
    /// The callback runs twice on the copy: with `true` right after the
    /// graph is copied, then with `false` once the copy is final and just
    /// before per-layer records are created.
    pub fn quantize_with_callback<F>(
        &mut self,
        network: &Network,
        scales: &[f32],
        callback: F,
    ) -> Result<QuantizedNetwork>
    where
        F: FnMut(&mut Network, bool) -> Result<()>,
    {
        self.run(network, scales, Calibration::FromConfig, callback)
    }

    fn run<F>(
        &mut self,
        network: &Network,
        scales: &[f32],
        calibration: Calibration,
        callback: F,
    ) -> Result<QuantizedNetwork>
    where
        F: FnMut(&mut Network, bool) -> Result<()>,
    {
        self.reset();
        match self.execute(network, scales, calibration, callback) {
            Ok(quantized) => {
                self.advance();
                info!(layers = quantized.layers.len(), "quantization complete");
                Ok(quantized)
            }
            Err(e) => {
                warn!(stage = self.stage.display_name(), error = %e, "quantization failed");
                self.fail(e.to_string());
                Err(e)
            }
        }
    }

    fn advance(&mut self) {
        self.stage = self.stage.next();
        debug!(stage = self.stage.display_name(), "quantization stage");
    }

    fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.stage = QuantizationStage::Failed;
    }

    fn execute<F>(
        &mut self,
        network: &Network,
        scales: &[f32],
        calibration: Calibration,
        mut callback: F,
    ) -> Result<QuantizedNetwork>
    where
        F: FnMut(&mut Network, bool) -> Result<()>,
    {
        self.config
            .validate()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        self.advance(); // -> CopyingGraph
        let mut network = network.clone();
        callback(&mut network, true)?;
        callback(&mut network, false)?;
        let mut table = QuantTable::new(network.len());

        self.advance(); // -> SeedingInputs
        self.seed_inputs(&network, &mut table, scales)?;

        self.advance(); // -> LoadingCalibration
        let stats = match calibration {
            Calibration::FromConfig => self.load_calibration(),
            Calibration::Provided(stats) => stats,
        };

        self.advance(); // -> PropagatingRanges
        let calibrated = stats.is_some();
        let (seeded_layers, propagation) = match stats {
            Some(store) => {
                let propagator = RangePropagator::from_config(&self.config);
                let seeded = propagator.seed_from_calibration(&network, &mut table, &store)?;
                drop(store);
                propagator.normalize_input_ranges(&network, &mut table)?;
                (seeded, propagator.propagate(&network, &mut table)?)
            }
            None => (0, PropagationReport::default()),
        };

        self.advance(); // -> DerivingScales
        let mut calculator = ScaleFactorCalculator::new(&network, &self.config)?;
        calculator.run(&mut table)?;
        let restarts = calculator.restarts();
        let conflicts = calculator.conflicts().to_vec();

        self.advance(); // -> Quantizing
        let mut quantizer = LayersQuantizer::new(&self.config);
        for id in network.topological_order()? {
            let layer = network.layer(id).ok_or(Error::UnknownLayer(id))?;
            transform_layer(&mut quantizer, layer, &mut table)?;
        }

        let report = QuantizationReport {
            layers: QuantizationReport::collect_layers(&network, &table),
            calibrated,
            seeded_layers,
            propagation_steps: propagation.steps,
            restarts,
            anomalies: propagation.anomalies,
            conflicts,
        };

        Ok(QuantizedNetwork {
            network,
            params: table,
            layers: quantizer.into_layers(),
            report,
        })
    }

    /// Assign input scales in declaration order.
    fn seed_inputs(&self, network: &Network, table: &mut QuantTable, scales: &[f32]) -> Result<()> {
        if scales.is_empty() {
            return Err(Error::EmptyScaleFactors);
        }
        let inputs = network.input_ids();
        if scales.len() < inputs.len() {
            return Err(Error::MissingInputScales {
                inputs: inputs.len(),
                provided: scales.len(),
            });
        }
        if scales.len() > inputs.len() {
            debug!(
                inputs = inputs.len(),
                provided = scales.len(),
                "ignoring extra scale factors"
            );
        }
        for (&id, &scale) in inputs.iter().zip(scales) {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "Input scale factor must be positive and finite, got {scale}"
                )));
            }
            table
                .get_mut(id)
                .ok_or(Error::UnknownLayer(id))?
                .src
                .set_scale(scale);
        }
        Ok(())
    }

    fn load_calibration(&self) -> Option<StatisticsStore> {
        let path = self.config.stats_path()?;
        if !path.exists() {
            debug!(path = %path.display(), "no calibration snapshot");
            return None;
        }
        match StatisticsStore::load(path) {
            Ok(store) => {
                info!(
                    path = %path.display(),
                    layers = store.layer_count(),
                    "loaded calibration snapshot"
                );
                Some(store)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable calibration snapshot");
                None
            }
        }
    }
}
