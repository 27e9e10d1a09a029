//! Tests for the quantization pipeline module

use super::*;
use crate::config::QuantizerConfig;
use crate::error::Error;
use crate::graph::{LayerKind, Network};
use crate::quant::{transform_layer, QuantTable, WeightPrecision};
use crate::stats::{StatisticsStore, TensorRole};
use approx::assert_abs_diff_eq;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn quantizer() -> ModelQuantizer {
    ModelQuantizer::new(QuantizerConfig::new().without_stats())
}

/// `in -> fc(affine) -> act(activation)`
fn affine_net() -> Network {
    let mut net = Network::new();
    let input = net.add_input("in").unwrap();
    let fc = net.add_layer("fc", LayerKind::Affine, vec![input]).unwrap();
    net.add_layer("act", LayerKind::Activation, vec![fc]).unwrap();
    net.set_weights(fc, vec![0.5, -0.25], Some(vec![0.1])).unwrap();
    net
}

fn calibration_for(net: &Network, ranges: &[(&str, f32, f32)]) -> StatisticsStore {
    let mut store = StatisticsStore::new(net.len());
    for (i, &(name, min, max)) in ranges.iter().enumerate() {
        store.set_layer_name(i, name).unwrap();
        store.update(i, TensorRole::Output, &[min, max]).unwrap();
    }
    store
}

// =============================================================================
// QuantizationStage Tests
// =============================================================================

#[test]
fn test_stage_is_active() {
    // TEST_ID: QP-001
    assert!(!QuantizationStage::Idle.is_active(), "QP-001 FALSIFIED: Idle should not be active");
    assert!(QuantizationStage::SeedingInputs.is_active());
    assert!(QuantizationStage::Quantizing.is_active());
    assert!(!QuantizationStage::Complete.is_active());
    assert!(!QuantizationStage::Failed.is_active());
}

#[test]
fn test_stage_is_terminal() {
    // TEST_ID: QP-002
    assert!(!QuantizationStage::Idle.is_terminal());
    assert!(!QuantizationStage::DerivingScales.is_terminal());
    assert!(QuantizationStage::Complete.is_terminal());
    assert!(QuantizationStage::Failed.is_terminal());
}

#[test]
fn test_stage_sequence() {
    // TEST_ID: QP-003
    let mut stage = QuantizationStage::default();
    let mut names = vec![stage.display_name()];
    while !stage.is_terminal() {
        stage = stage.next();
        names.push(stage.display_name());
    }
    assert_eq!(
        names,
        vec![
            "Idle",
            "Copying Graph",
            "Seeding Inputs",
            "Loading Calibration",
            "Propagating Ranges",
            "Deriving Scales",
            "Quantizing",
            "Complete",
        ]
    );
    assert_eq!(QuantizationStage::Failed.next(), QuantizationStage::Failed);
}

// =============================================================================
// Orchestrator error handling
// =============================================================================

#[test]
fn test_empty_scale_factors() {
    // TEST_ID: QP-010
    let mut q = quantizer();
    let err = q.quantize(&affine_net(), &[]).unwrap_err();
    assert!(matches!(err, Error::EmptyScaleFactors));
    assert_eq!(err.to_string(), "Scale factor is empty");
    assert!(q.failed(), "QP-010 FALSIFIED: stage should be Failed");
    assert_eq!(q.error(), Some("Scale factor is empty"));
}

#[test]
fn test_missing_input_scales() {
    // TEST_ID: QP-011
    let mut net = Network::new();
    let a = net.add_input("a").unwrap();
    let b = net.add_input("b").unwrap();
    net.add_layer("sum", LayerKind::Eltwise, vec![a, b]).unwrap();

    let err = quantizer().quantize(&net, &[1.0]).unwrap_err();
    assert!(matches!(err, Error::MissingInputScales { inputs: 2, provided: 1 }));
    assert!(err.is_config_error());
}

#[test]
fn test_non_positive_scale_rejected() {
    // TEST_ID: QP-012
    for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let err = quantizer().quantize_single(&affine_net(), bad).unwrap_err();
        assert!(err.is_config_error(), "QP-012 FALSIFIED: {bad} accepted");
    }
}

#[test]
fn test_invalid_config_rejected() {
    // TEST_ID: QP-013
    let mut q = ModelQuantizer::new(QuantizerConfig::new().without_stats().with_guardband(0.5));
    let err = q.quantize_single(&affine_net(), 1.0).unwrap_err();
    assert!(err.is_config_error());
    assert!(q.failed());
}

#[test]
fn test_reset_after_failure() {
    // TEST_ID: QP-014
    let mut q = quantizer();
    assert!(q.quantize(&affine_net(), &[]).is_err());
    q.quantize_single(&affine_net(), 2.0).unwrap();
    assert!(q.succeeded());
    assert_eq!(q.error(), None);
}

// =============================================================================
// Orchestrator results
// =============================================================================

#[test]
fn test_caller_graph_untouched() {
    // TEST_ID: QP-020
    let net = affine_net();
    let before = net.clone();
    let result = quantizer()
        .quantize_with_callback(&net, &[2.0], |copy, before_copy| {
            if before_copy {
                copy.set_weights(1, vec![1.0], None)?;
            }
            Ok(())
        })
        .unwrap();

    assert_eq!(net, before, "QP-020 FALSIFIED: caller graph modified");
    assert_eq!(result.network.layer(1).unwrap().weights, Some(vec![1.0]));
}

#[test]
fn test_callback_error_fails_pipeline() {
    // TEST_ID: QP-021
    let mut q = quantizer();
    let err = q
        .quantize_with_callback(&affine_net(), &[2.0], |_, _| {
            Err(Error::ConfigError("rejected".into()))
        })
        .unwrap_err();
    assert!(err.to_string().contains("rejected"));
    assert!(q.failed());
}

#[test]
fn test_callback_runs_before_and_after_copy() {
    // TEST_ID: QP-042
    let mut calls = Vec::new();
    let result = quantizer()
        .quantize_with_callback(&affine_net(), &[2.0], |copy, before_copy| {
            calls.push(before_copy);
            if !before_copy {
                copy.add_layer("tail", LayerKind::Copy, vec![1])?;
            }
            Ok(())
        })
        .unwrap();

    assert_eq!(calls, vec![true, false], "QP-042 FALSIFIED: callback order");
    // layers added by the second call still get records
    assert_eq!(result.params.len(), 4);
    assert_eq!(result.params[3].dst.scale(), result.params[1].dst.scale());
}

#[test]
fn test_uncalibrated_quantization() {
    // TEST_ID: QP-022
    let mut q = quantizer();
    let result = q.quantize_single(&affine_net(), 2.0).unwrap();
    assert_eq!(q.stage(), QuantizationStage::Complete);

    let fc = &result.params[1];
    assert_eq!(fc.weights.scale(), 32768.0);
    assert_eq!(fc.dst.scale(), 65536.0);
    assert!(fc.weights_quantized);
    assert_eq!(fc.dst.levels(), 65536);
    assert_eq!(fc.weights.min_values(), &[-0.25]);
    assert_eq!(fc.weights.max_values(), &[0.5]);

    let layer = result.layer("fc").unwrap();
    assert_eq!(layer.weights, Some(QuantizedWeights::I16(vec![16384, -8192])));
    assert_eq!(layer.biases, Some(vec![6554]));
    assert!(result.layer("act").unwrap().weights.is_none());

    assert!(!result.report.calibrated);
    assert_eq!(result.report.layers.len(), 3);
    assert_eq!(result.report.layer("act").unwrap().output_scale, 65536.0);
}

#[test]
fn test_extra_scales_ignored() {
    // TEST_ID: QP-023
    let result = quantizer().quantize(&affine_net(), &[2.0, 5.0]).unwrap();
    assert_eq!(result.params[0].src.scale(), 2.0);
}

#[test]
fn test_calibrated_quantization() {
    // TEST_ID: QP-024
    let net = affine_net();
    let store = calibration_for(&net, &[("in", -1.0, 1.0), ("fc", -4.0, 2.0), ("act", 0.0, 3.0)]);
    let result = quantizer()
        .quantize_with_stats(&net, &[2048.0], Some(store))
        .unwrap();

    // input range pinned to 16384 / 2048
    assert_eq!(result.params[0].dst.dynamic_range(), 8.0);
    assert_eq!(result.params[1].src.aggregated_dynamic_range(), 8.0);
    assert_eq!(result.params[1].dst.aggregated_dynamic_range(), 4.0);

    // 32768 / ceil(4 * 1.25)
    assert_abs_diff_eq!(result.params[1].dst.scale(), 6553.6, epsilon = 1e-2);
    assert_abs_diff_eq!(result.params[1].weights.scale(), 3.2, epsilon = 1e-4);
    assert_abs_diff_eq!(result.params[2].dst.scale(), 6553.6, epsilon = 1e-2);

    let report = &result.report;
    assert!(report.calibrated);
    assert_eq!(report.seeded_layers, 3);
    assert!(report.propagation_steps >= net.len());
    assert!(report.anomalies.is_empty());
    assert_eq!(report.restarts, 0);
}

#[test]
fn test_calibration_from_snapshot_file() {
    // TEST_ID: QP-025
    let net = affine_net();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("layer_statistics.txt");
    calibration_for(&net, &[("in", -1.0, 1.0), ("fc", -4.0, 2.0), ("act", 0.0, 3.0)])
        .save(&path)
        .unwrap();

    let mut q = ModelQuantizer::new(QuantizerConfig::new().with_stats_path(&path));
    let result = q.quantize_single(&net, 2048.0).unwrap();
    assert!(result.report.calibrated, "QP-025 FALSIFIED: snapshot not applied");
    assert_abs_diff_eq!(result.params[1].dst.scale(), 6553.6, epsilon = 1e-2);
}

#[test]
fn test_corrupt_snapshot_treated_as_absent() {
    // TEST_ID: QP-026
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "NOT_A_SNAPSHOT 3").unwrap();

    let mut q = ModelQuantizer::new(QuantizerConfig::new().with_stats_path(file.path()));
    let result = q.quantize_single(&affine_net(), 2.0).unwrap();
    assert!(!result.report.calibrated);
    assert!(q.succeeded());
}

#[test]
fn test_missing_snapshot_treated_as_absent() {
    // TEST_ID: QP-027
    let dir = TempDir::new().unwrap();
    let config = QuantizerConfig::new().with_stats_path(dir.path().join("absent.txt"));
    let result = ModelQuantizer::new(config)
        .quantize_single(&affine_net(), 2.0)
        .unwrap();
    assert!(!result.report.calibrated);
}

/// `in -> A, in -> B, concat(A, B)` with weights on both branches.
fn fan_in_net() -> Network {
    let mut net = Network::new();
    let input = net.add_input("in").unwrap();
    let a = net.add_layer("A", LayerKind::Affine, vec![input]).unwrap();
    let b = net.add_layer("B", LayerKind::Affine, vec![input]).unwrap();
    net.add_layer("C", LayerKind::Concat, vec![a, b]).unwrap();
    net.set_weights(a, vec![0.5], None).unwrap();
    net.set_weights(b, vec![0.5], None).unwrap();
    net
}

#[test]
fn test_anomaly_reported() {
    // TEST_ID: QP-028
    let net = fan_in_net();
    let store = calibration_for(&net, &[("A", -3.0, 1.0), ("B", 0.0, 7.0)]);
    let result = quantizer()
        .quantize_with_stats(&net, &[1024.0], Some(store))
        .unwrap();

    assert_eq!(result.report.anomalies.len(), 1);
    assert_eq!(result.report.anomalies[0].name, "A");
    // both branches now share the 7.0 range and the same scale
    assert_eq!(result.params[1].dst.scale(), result.params[2].dst.scale());
}

#[test]
fn test_strict_anomaly_fails() {
    // TEST_ID: QP-029
    let net = fan_in_net();
    let store = calibration_for(&net, &[("A", -3.0, 1.0), ("B", 0.0, 7.0)]);
    let mut q = ModelQuantizer::new(QuantizerConfig::new().without_stats().with_strict_ranges(true));
    let err = q.quantize_with_stats(&net, &[1024.0], Some(store)).unwrap_err();
    assert!(matches!(err, Error::RangeAnomaly { .. }));
    assert!(q.failed());
    assert!(q.error().unwrap().contains("anomaly"));
}

#[test]
fn test_report_formats() {
    // TEST_ID: QP-030
    let result = quantizer().quantize_single(&affine_net(), 2.0).unwrap();
    let json = result.report.to_json().unwrap();
    let back: QuantizationReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result.report);

    let text = result.report.to_string();
    assert!(text.contains("Calibration: none"));
    assert!(text.contains("Id\tKind\tIn scale\tOut scale\tWeight scale\tRange\tName"));
    assert!(text.contains("affine"));
}

// =============================================================================
// LayersQuantizer
// =============================================================================

#[test]
fn test_weights_saturate() {
    // TEST_ID: QP-040
    let mut net = Network::new();
    let input = net.add_input("in").unwrap();
    let fc = net.add_layer("fc", LayerKind::Affine, vec![input]).unwrap();
    net.set_weights(fc, vec![1.0, -1.0, 0.0], Some(vec![1.0e6])).unwrap();

    let mut table = QuantTable::new(net.len());
    table[fc].weights.set_scale(100_000.0);
    table[fc].bias.set_scale(1.0e6);

    let mut quantizer = LayersQuantizer::new(&QuantizerConfig::default());
    transform_layer(&mut quantizer, net.layer(fc).unwrap(), &mut table).unwrap();
    let layer = &quantizer.layers()[0];
    assert_eq!(layer.weights, Some(QuantizedWeights::I16(vec![32767, -32768, 0])));
    assert_eq!(layer.biases, Some(vec![i32::MAX]));

    let mut quantizer =
        LayersQuantizer::new(&QuantizerConfig::new().with_weights_precision(WeightPrecision::I8));
    transform_layer(&mut quantizer, net.layer(fc).unwrap(), &mut table).unwrap();
    let weights = quantizer.layers()[0].weights.as_ref().unwrap();
    assert_eq!(weights, &QuantizedWeights::I8(vec![127, -128, 0]));
    assert_eq!(weights.to_i32(), vec![127, -128, 0]);
    assert_eq!(table[fc].weights.levels(), 256);
}

#[test]
fn test_transform_rejects_unknown_layer() {
    // TEST_ID: QP-041
    let net = affine_net();
    let mut table = QuantTable::new(1);
    let mut quantizer = LayersQuantizer::new(&QuantizerConfig::default());
    assert!(matches!(
        transform_layer(&mut quantizer, net.layer(2).unwrap(), &mut table),
        Err(Error::UnknownLayer(2))
    ));
}
