//! End-to-end quantization tests
//!
//! Collects statistics with a calibration session, persists them, and feeds
//! the snapshot to the quantizer the way a float run followed by a
//! quantization run would.

use quantcal::config::{load_config, QuantizerConfig};
use quantcal::graph::{LayerKind, Network, NetworkSpec};
use quantcal::pipeline::{ModelQuantizer, QuantizationStage, QuantizedWeights};
use quantcal::runtime::{CalibrationSession, ExecutionObserver};
use quantcal::stats::{StatisticsStore, TensorRole};
use quantcal::Error;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

/// Feed every layer a fixed output range, as a float run would.
fn calibrate(network: &Network, path: &Path, outputs: &[(&str, [f32; 2])]) {
    let names: Vec<&str> = network.layers().iter().map(|l| l.name.as_str()).collect();
    let mut session = CalibrationSession::new(&names, path).unwrap();
    for &(name, range) in outputs {
        let id = network.find_by_name(name).unwrap();
        session.after_layer(id, &range, &range).unwrap();
    }
    for layer in network.layers() {
        if let Some(weights) = &layer.weights {
            session
                .record_parameters(layer.id, weights, layer.biases.as_deref())
                .unwrap();
        }
    }
    session.finish().unwrap();
}

#[test]
fn demo_files_load() {
    for name in ["fan_in.yaml", "recurrent.yaml"] {
        let spec = NetworkSpec::load(demo(name)).unwrap_or_else(|e| panic!("{name}: {e}"));
        let network = spec.build().unwrap_or_else(|e| panic!("{name}: {e}"));
        assert!(!network.is_empty());
        assert_eq!(network.input_ids().len(), 1, "{name}: one graph input expected");
    }
    let config = load_config(demo("quantizer.yaml")).unwrap();
    assert_eq!(config, QuantizerConfig::default());
}

#[test]
fn calibrated_fan_in_shares_branch_scale() {
    let dir = TempDir::new().unwrap();
    let stats = dir.path().join("layer_statistics.txt");
    let network = NetworkSpec::load(demo("fan_in.yaml")).unwrap().build().unwrap();
    calibrate(
        &network,
        &stats,
        &[
            ("input", [-1.0, 1.0]),
            ("branch_a", [-3.0, 2.0]),
            ("branch_b", [-1.0, 7.0]),
            ("join", [-3.0, 7.0]),
            ("relu", [0.0, 7.0]),
        ],
    );

    let mut quantizer = ModelQuantizer::new(QuantizerConfig::new().with_stats_path(&stats));
    let result = quantizer.quantize_single(&network, 1024.0).unwrap();
    assert_eq!(quantizer.stage(), QuantizationStage::Complete);

    let a = network.find_by_name("branch_a").unwrap();
    let b = network.find_by_name("branch_b").unwrap();
    let join = network.find_by_name("join").unwrap();

    assert!(result.report.calibrated);
    assert_eq!(result.params[a].dst.aggregated_dynamic_range(), 7.0);
    assert_eq!(result.params[b].dst.aggregated_dynamic_range(), 7.0);
    assert_eq!(result.params[a].dst.scale(), result.params[b].dst.scale());
    assert_eq!(result.params[join].src.scale(), result.params[a].dst.scale());

    // branch_a was calibrated at 3.0 and had to follow its sibling
    assert_eq!(result.report.anomalies.len(), 1);
    assert_eq!(result.report.anomalies[0].name, "branch_a");
    assert!(result.report.conflicts.is_empty());

    let weights = result.layer("branch_b").unwrap().weights.as_ref().unwrap();
    assert_eq!(weights.len(), 4);
    assert!(matches!(weights, QuantizedWeights::I16(_)));
}

#[test]
fn recurrent_graph_converges() {
    let dir = TempDir::new().unwrap();
    let stats = dir.path().join("layer_statistics.txt");
    let network = NetworkSpec::load(demo("recurrent.yaml")).unwrap().build().unwrap();
    calibrate(
        &network,
        &stats,
        &[("input", [-1.0, 1.0]), ("cell", [-5.0, 4.0]), ("act", [0.0, 4.0])],
    );

    let config = QuantizerConfig::new().with_stats_path(&stats);
    let result = ModelQuantizer::new(config).quantize_single(&network, 2048.0).unwrap();

    let state = network.find_by_name("state").unwrap();
    let merge = network.find_by_name("merge").unwrap();
    // the memory read carries the range written back by the cell
    assert!(result.params[state].dst.aggregated_dynamic_range() >= 5.0);
    assert!(result.params[merge].src.aggregated_dynamic_range() >= 8.0);
    for (_, params) in result.params.iter() {
        assert!(params.dst.is_scale_set());
        assert!(params.dst.scale() > 0.0);
    }
}

#[test]
fn uncalibrated_run_uses_input_scale() {
    let network = NetworkSpec::load(demo("fan_in.yaml")).unwrap().build().unwrap();
    let dir = TempDir::new().unwrap();
    let config = QuantizerConfig::new().with_stats_path(dir.path().join("absent.txt"));
    let result = ModelQuantizer::new(config).quantize(&network, &[4.0]).unwrap();

    assert!(!result.report.calibrated);
    assert_eq!(result.params[0].dst.scale(), 4.0);
    // branch_b has the larger weights; branch_a is capped to its output scale
    let a = network.find_by_name("branch_a").unwrap();
    let b = network.find_by_name("branch_b").unwrap();
    assert_eq!(result.params[a].dst.scale(), result.params[b].dst.scale());
    assert!(result.report.restarts >= 1);
}

#[test]
fn missing_scales_leave_caller_graph_untouched() {
    let mut network = Network::new();
    let a = network.add_input("a").unwrap();
    let b = network.add_input("b").unwrap();
    network.add_layer("sum", LayerKind::Eltwise, vec![a, b]).unwrap();
    let before = network.clone();

    let mut quantizer = ModelQuantizer::new(QuantizerConfig::new().without_stats());
    let err = quantizer.quantize(&network, &[1.0]).unwrap_err();
    assert!(matches!(err, Error::MissingInputScales { inputs: 2, provided: 1 }));
    assert!(quantizer.failed());
    assert_eq!(network, before);
}

#[test]
fn calibration_session_snapshot_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("layer_statistics.txt");
    {
        let mut session = CalibrationSession::new(&["conv", "relu"], &path).unwrap();
        session.after_layer(0, &[0.5, 1.5], &[-2.0, 8.0]).unwrap();
        session.after_layer(1, &[-2.0, 8.0], &[0.0, 8.0]).unwrap();
        // dropped without finish: the snapshot is still written
    }
    let store = StatisticsStore::load(&path).unwrap();
    assert_eq!(store.find_layer_by_name(" relu "), Some(1));
    assert_eq!(store.min_max(0, TensorRole::Output).unwrap(), (-2.0, 8.0));
    assert_eq!(store.mean_stddev(0, TensorRole::Input).unwrap().0, 1.0);
}
