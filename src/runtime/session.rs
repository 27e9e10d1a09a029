//! Calibration session.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::stats::{StatisticsStore, TensorRole};

/// Hook invoked by a float runtime once per executed layer.
pub trait ExecutionObserver {
    fn after_layer(&mut self, index: usize, inputs: &[f32], outputs: &[f32]) -> Result<()>;
}

/// Collects layer statistics during a float run.
///
/// The snapshot is written by [`CalibrationSession::finish`]. A session that
/// is dropped without finishing still writes it; failures are logged.
#[derive(Debug)]
pub struct CalibrationSession {
    store: StatisticsStore,
    output_path: PathBuf,
    finished: bool,
}

impl CalibrationSession {
    /// Session for layers named by `layer_names`, indexed by position.
    pub fn new<S: AsRef<str>>(layer_names: &[S], output_path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = StatisticsStore::new(layer_names.len());
        for (index, name) in layer_names.iter().enumerate() {
            store.set_layer_name(index, name.as_ref())?;
        }
        Ok(Self {
            store,
            output_path: output_path.into(),
            finished: false,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn store(&self) -> &StatisticsStore {
        &self.store
    }

    /// Rename a layer.
    pub fn set_layer_name(&mut self, index: usize, name: &str) -> Result<()> {
        Ok(self.store.set_layer_name(index, name)?)
    }

    /// Fold samples of one tensor.
    pub fn update(&mut self, index: usize, role: TensorRole, samples: &[f32]) -> Result<()> {
        Ok(self.store.update(index, role, samples)?)
    }

    /// Fold the weights and biases of a layer.
    pub fn record_parameters(&mut self, index: usize, weights: &[f32], biases: Option<&[f32]>) -> Result<()> {
        self.store.update(index, TensorRole::Weight, weights)?;
        if let Some(biases) = biases {
            self.store.update(index, TensorRole::Bias, biases)?;
        }
        Ok(())
    }

    /// Write the snapshot and hand back the statistics.
    pub fn finish(mut self) -> Result<StatisticsStore> {
        self.store.save(&self.output_path)?;
        self.finished = true;
        debug!(path = %self.output_path.display(), "calibration snapshot written");
        Ok(std::mem::replace(&mut self.store, StatisticsStore::new(0)))
    }
}

impl ExecutionObserver for CalibrationSession {
    fn after_layer(&mut self, index: usize, inputs: &[f32], outputs: &[f32]) -> Result<()> {
        self.store.update(index, TensorRole::Input, inputs)?;
        self.store.update(index, TensorRole::Output, outputs)?;
        Ok(())
    }
}

impl Drop for CalibrationSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.store.save(&self.output_path) {
            Ok(()) => debug!(path = %self.output_path.display(), "calibration snapshot written on drop"),
            Err(e) => warn!(
                path = %self.output_path.display(),
                error = %e,
                "failed to write calibration snapshot"
            ),
        }
    }
}
