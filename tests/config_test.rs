//! Integration tests for configuration loading

use latency_recorder::infra::Config;
use latency_recorder::recorder::{RecorderMode, Recorders};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[recorder]
mode = "rough"
most_time_threshold_ms = 500
out_threshold_count = 32
decay_ratio = 2.0

[metrics]
interval_secs = 15

[load]
workers = 2
tags = ["GET /health"]
base_latency_ms = 5
jitter_ms = 10
outlier_pct = 0.5
seed = 99
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.recorder_mode(), RecorderMode::Rough);
    assert_eq!(config.most_time_threshold_ms(), 500);
    assert_eq!(config.out_threshold_count(), 32);
    assert_eq!(config.decay_ratio(), 2.0);
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.load_workers(), 2);
    assert_eq!(config.load_tags(), &["GET /health".to_string()]);
    assert_eq!(config.load_seed(), 99);
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.recorder_mode(), RecorderMode::Accurate);
    assert_eq!(config.most_time_threshold_ms(), 1000);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[recorder]\nmost_time_threshold_ms = 0\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
    let config = Config::load_from_path(temp_file.path());
    assert_eq!(config.most_time_threshold_ms(), 1000);
}

#[test]
fn test_settings_flow_into_registry() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[recorder]\nmode = \"accurate\"\nmost_time_threshold_ms = 100\ndecay_ratio = 2.0\n")
        .unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    let registry = Recorders::new(config.recorder_settings());
    let recorder = registry.register("GET /orders");
    assert_eq!(recorder.threshold(), 100);

    // 180 ms is within 2.0 × threshold, so it keeps its overflow slot across reset
    recorder.record_elapsed(180);
    recorder.reset();
    assert_eq!(recorder.out_threshold_cardinality(), 1);
}
