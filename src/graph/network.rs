//! Layer graph container with topological ordering.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use thiserror::Error;

use super::layer::{Layer, LayerId, LayerKind};

/// Graph construction and ordering errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown layer id {0}")]
    UnknownLayer(LayerId),

    #[error("Unknown layer name '{0}'")]
    UnknownLayerName(String),

    #[error("Duplicate layer name '{0}'")]
    DuplicateName(String),

    #[error("Layer '{layer}' of kind {kind} needs at least one input")]
    MissingInputs { layer: String, kind: &'static str },

    #[error("Layer '{0}' does not take weights")]
    UnexpectedWeights(String),

    #[error("Forward edges contain a cycle: ordered {ordered} of {total} layers")]
    Cycle { ordered: usize, total: usize },
}

/// Computation graph of layers.
///
/// Layers are stored in insertion order and addressed by [`LayerId`].
/// Cloning performs a deep copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    layers: Vec<Layer>,
    inputs: Vec<LayerId>,
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a graph input. Inputs keep their declaration order.
    pub fn add_input(&mut self, name: impl Into<String>) -> Result<LayerId, GraphError> {
        let id = self.push(name.into(), LayerKind::Input, Vec::new())?;
        self.inputs.push(id);
        Ok(id)
    }

    /// Add a layer fed by already existing layers.
    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        kind: LayerKind,
        inputs: Vec<LayerId>,
    ) -> Result<LayerId, GraphError> {
        let name = name.into();
        if kind == LayerKind::Input {
            return self.add_input(name);
        }
        if inputs.is_empty() && kind != LayerKind::Memory {
            return Err(GraphError::MissingInputs { layer: name, kind: kind.as_str() });
        }
        if let Some(&bad) = inputs.iter().find(|&&i| i >= self.layers.len()) {
            return Err(GraphError::UnknownLayer(bad));
        }
        self.push(name, kind, inputs)
    }

    /// Attach weights (and optional biases) to a weighted layer.
    pub fn set_weights(
        &mut self,
        id: LayerId,
        weights: Vec<f32>,
        biases: Option<Vec<f32>>,
    ) -> Result<(), GraphError> {
        let layer = self.layers.get_mut(id).ok_or(GraphError::UnknownLayer(id))?;
        if !layer.kind.has_weights() {
            return Err(GraphError::UnexpectedWeights(layer.name.clone()));
        }
        layer.weights = Some(weights);
        layer.biases = biases;
        Ok(())
    }

    /// Declare that `to` reads, one step later, what `from` produces.
    pub fn add_recurrent_edge(&mut self, from: LayerId, to: LayerId) -> Result<(), GraphError> {
        if from >= self.layers.len() {
            return Err(GraphError::UnknownLayer(from));
        }
        let layer = self.layers.get_mut(to).ok_or(GraphError::UnknownLayer(to))?;
        if !layer.recurrent_inputs.contains(&from) {
            layer.recurrent_inputs.push(from);
        }
        Ok(())
    }

    /// Get a layer by id.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// All layers in insertion order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if the network has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Graph inputs in declaration order.
    pub fn input_ids(&self) -> &[LayerId] {
        &self.inputs
    }

    /// Find a layer by exact name.
    pub fn find_by_name(&self, name: &str) -> Option<LayerId> {
        self.layers.iter().position(|l| l.name == name)
    }

    /// Consumers of every layer, forward and recurrent.
    pub fn successor_lists(&self) -> Vec<Vec<LayerId>> {
        let mut successors = vec![Vec::new(); self.layers.len()];
        for layer in &self.layers {
            for pred in layer.predecessors() {
                if !successors[pred].contains(&layer.id) {
                    successors[pred].push(layer.id);
                }
            }
        }
        successors
    }

    /// Topological order over forward edges (Kahn's algorithm).
    ///
    /// Ties are broken by the smallest id so the order is deterministic.
    pub fn topological_order(&self) -> Result<Vec<LayerId>, GraphError> {
        let order = self.kahns_algorithm(self.in_degrees());
        if order.len() != self.layers.len() {
            return Err(GraphError::Cycle { ordered: order.len(), total: self.layers.len() });
        }
        Ok(order)
    }

    fn push(&mut self, name: String, kind: LayerKind, inputs: Vec<LayerId>) -> Result<LayerId, GraphError> {
        if self.find_by_name(&name).is_some() {
            return Err(GraphError::DuplicateName(name));
        }
        let id = self.layers.len();
        self.layers.push(Layer::new(id, name, kind, inputs));
        Ok(id)
    }

    /// Forward in-degree of every layer.
    fn in_degrees(&self) -> Vec<usize> {
        self.layers.iter().map(|layer| layer.inputs.len()).collect()
    }

    fn kahns_algorithm(&self, mut in_degree: Vec<usize>) -> Vec<LayerId> {
        let mut consumers: Vec<Vec<LayerId>> = vec![Vec::new(); self.layers.len()];
        for layer in &self.layers {
            for &input in &layer.inputs {
                consumers[input].push(layer.id);
            }
        }

        // min-heap so ties resolve to the smallest id
        let mut ready: BinaryHeap<Reverse<LayerId>> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(id, _)| Reverse(id))
            .collect();

        let mut order = Vec::with_capacity(self.layers.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for &next in &consumers[id] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
        order
    }
}
