//! YAML description of a network.
//!
//! ```yaml
//! layers:
//!   - name: input
//!     kind: input
//!   - name: fc1
//!     kind: affine
//!     inputs: [input]
//!     weights: [0.5, -0.25]
//!     biases: [0.1]
//!   - name: state
//!     kind: memory
//!     recurrent_inputs: [fc1]
//! ```
//!
//! Forward inputs must name earlier layers; recurrent inputs may name any
//! layer.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::layer::LayerKind;
use super::network::{GraphError, Network};
use crate::error::{Error, Result};

/// One layer of a [`NetworkSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub kind: LayerKind,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub recurrent_inputs: Vec<String>,
    #[serde(default)]
    pub weights: Option<Vec<f32>>,
    #[serde(default)]
    pub biases: Option<Vec<f32>>,
}

/// Serializable network description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    /// Parse a YAML description.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::ConfigError(format!("Failed to parse network description: {e}")))
    }

    /// Read and parse a YAML description file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to read network description {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Build the network.
    pub fn build(&self) -> std::result::Result<Network, GraphError> {
        let mut network = Network::new();
        for spec in &self.layers {
            let inputs = spec
                .inputs
                .iter()
                .map(|name| {
                    network
                        .find_by_name(name)
                        .ok_or_else(|| GraphError::UnknownLayerName(name.clone()))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let id = network.add_layer(spec.name.clone(), spec.kind, inputs)?;
            if let Some(weights) = &spec.weights {
                network.set_weights(id, weights.clone(), spec.biases.clone())?;
            }
        }

        for (id, spec) in self.layers.iter().enumerate() {
            for name in &spec.recurrent_inputs {
                let from = network
                    .find_by_name(name)
                    .ok_or_else(|| GraphError::UnknownLayerName(name.clone()))?;
                network.add_recurrent_edge(from, id)?;
            }
        }
        Ok(network)
    }
}
