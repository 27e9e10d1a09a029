//! Quantization pipeline stage enum
//!
//! Defines the stages a quantization call walks through.

use serde::{Deserialize, Serialize};

/// Current stage of the quantization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuantizationStage {
    /// Not started.
    #[default]
    Idle,
    /// Copying the caller's graph.
    CopyingGraph,
    /// Assigning input scale factors.
    SeedingInputs,
    /// Reading calibration statistics.
    LoadingCalibration,
    /// Propagating aggregated dynamic ranges.
    PropagatingRanges,
    /// Deriving per-layer scale factors.
    DerivingScales,
    /// Converting weights and biases.
    Quantizing,
    /// Pipeline complete.
    Complete,
    /// Pipeline failed.
    Failed,
}

impl QuantizationStage {
    /// Check if the pipeline is in an active (non-terminal) state.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            QuantizationStage::CopyingGraph
                | QuantizationStage::SeedingInputs
                | QuantizationStage::LoadingCalibration
                | QuantizationStage::PropagatingRanges
                | QuantizationStage::DerivingScales
                | QuantizationStage::Quantizing
        )
    }

    /// Check if the pipeline is complete (success or failure).
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuantizationStage::Complete | QuantizationStage::Failed)
    }

    /// Stage that follows this one on success.
    pub fn next(&self) -> Self {
        match self {
            QuantizationStage::Idle => QuantizationStage::CopyingGraph,
            QuantizationStage::CopyingGraph => QuantizationStage::SeedingInputs,
            QuantizationStage::SeedingInputs => QuantizationStage::LoadingCalibration,
            QuantizationStage::LoadingCalibration => QuantizationStage::PropagatingRanges,
            QuantizationStage::PropagatingRanges => QuantizationStage::DerivingScales,
            QuantizationStage::DerivingScales => QuantizationStage::Quantizing,
            QuantizationStage::Quantizing => QuantizationStage::Complete,
            // Terminal states don't advance
            QuantizationStage::Complete | QuantizationStage::Failed => *self,
        }
    }

    /// Get display name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            QuantizationStage::Idle => "Idle",
            QuantizationStage::CopyingGraph => "Copying Graph",
            QuantizationStage::SeedingInputs => "Seeding Inputs",
            QuantizationStage::LoadingCalibration => "Loading Calibration",
            QuantizationStage::PropagatingRanges => "Propagating Ranges",
            QuantizationStage::DerivingScales => "Deriving Scales",
            QuantizationStage::Quantizing => "Quantizing",
            QuantizationStage::Complete => "Complete",
            QuantizationStage::Failed => "Failed",
        }
    }
}
