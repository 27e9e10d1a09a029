//! Validation error types
//!
//! Defines all validation error variants for quantizer configurations.

/// Validation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid guardband: {0} (must be >= 1.0)")]
    InvalidGuardband(f32),

    #[error("Invalid activation bits: {0} (must be in 2..=16)")]
    InvalidActivationBits(u8),

    #[error("Invalid max input feature value: {0} (must be > 0.0)")]
    InvalidMaxInputFeature(f32),

    #[error("Invalid minimum dynamic range: {0} (must be >= 0.0)")]
    InvalidMinDynamicRange(f32),

    #[error("Invalid default scale: {0} (must be > 0.0)")]
    InvalidDefaultScale(f32),

    #[error("Invalid propagation step budget: {0} (must be > 0)")]
    InvalidStepBudget(usize),

    #[error("Invalid anomaly tolerance: {0} (must be >= 0.0)")]
    InvalidAnomalyTolerance(f32),
}
