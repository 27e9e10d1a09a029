//! Property-based tests for configuration validation

use super::error::ValidationError;
use super::validator::validate_config;
use crate::config::QuantizerConfig;
use crate::quant::WeightPrecision;
use proptest::prelude::*;

fn arb_valid_config() -> impl Strategy<Value = QuantizerConfig> {
    (
        1.0f32..4.0,       // guardband
        2u8..=16,          // activation_bits
        any::<bool>(),     // i8 weights
        1.0f32..65536.0,   // max_input_feature_value
        1usize..1_000_000, // max_propagation_steps
        0.0f32..1.0,       // anomaly_tolerance
    )
        .prop_map(|(guardband, bits, i8_weights, max_input, steps, tolerance)| {
            let precision = if i8_weights {
                WeightPrecision::I8
            } else {
                WeightPrecision::I16
            };
            QuantizerConfig::new()
                .with_guardband(guardband)
                .with_activation_bits(bits)
                .with_weights_precision(precision)
                .with_max_input_feature_value(max_input)
                .with_max_propagation_steps(steps)
                .with_anomaly_tolerance(tolerance)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_config_passes(config in arb_valid_config()) {
        prop_assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn prop_shrinking_guardband_fails(config in arb_valid_config(), g in 0.0f32..0.999) {
        let config = config.with_guardband(g);
        prop_assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidGuardband(_))
        ));
    }

    #[test]
    fn prop_wide_activation_fails(config in arb_valid_config(), bits in 17u8..=u8::MAX) {
        let config = config.with_activation_bits(bits);
        prop_assert_eq!(
            validate_config(&config),
            Err(ValidationError::InvalidActivationBits(bits))
        );
    }
}
