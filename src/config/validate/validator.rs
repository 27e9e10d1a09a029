//! Configuration validation logic
//!
//! Validates quantizer configurations before a run starts.

use super::error::ValidationError;
use crate::config::QuantizerConfig;

/// Validate a quantizer configuration
///
/// Checks:
/// - The guardband never shrinks a range
/// - The activation width leaves room for a sign bit
/// - Scales, ranges and budgets are in usable ranges
pub fn validate_config(config: &QuantizerConfig) -> Result<(), ValidationError> {
    if !config.guardband().is_finite() || config.guardband() < 1.0 {
        return Err(ValidationError::InvalidGuardband(config.guardband()));
    }

    if !(2..=16).contains(&config.activation_bits()) {
        return Err(ValidationError::InvalidActivationBits(
            config.activation_bits(),
        ));
    }

    if !config.max_input_feature_value().is_finite() || config.max_input_feature_value() <= 0.0 {
        return Err(ValidationError::InvalidMaxInputFeature(
            config.max_input_feature_value(),
        ));
    }

    if config.min_dynamic_range().is_nan() || config.min_dynamic_range() < 0.0 {
        return Err(ValidationError::InvalidMinDynamicRange(
            config.min_dynamic_range(),
        ));
    }

    if !config.default_scale().is_finite() || config.default_scale() <= 0.0 {
        return Err(ValidationError::InvalidDefaultScale(config.default_scale()));
    }

    if config.max_propagation_steps() == 0 {
        return Err(ValidationError::InvalidStepBudget(
            config.max_propagation_steps(),
        ));
    }

    if config.anomaly_tolerance().is_nan() || config.anomaly_tolerance() < 0.0 {
        return Err(ValidationError::InvalidAnomalyTolerance(
            config.anomaly_tolerance(),
        ));
    }

    Ok(())
}
