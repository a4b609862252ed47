//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::recorder::{RecorderMode, RecorderSettings};
use anyhow::{ensure, Context};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct RecorderConfig {
    #[serde(default = "default_recorder_mode")]
    pub mode: RecorderMode,
    /// Values below this get an exact array slot (ms)
    #[serde(default = "default_most_time_threshold_ms")]
    pub most_time_threshold_ms: usize,
    /// Expected distinct values above threshold per window (presizes the overflow map)
    #[serde(default = "default_out_threshold_count")]
    pub out_threshold_count: usize,
    /// Overflow values above `decay_ratio × threshold` are evicted on reset
    #[serde(default = "default_decay_ratio")]
    pub decay_ratio: f64,
}

fn default_recorder_mode() -> RecorderMode {
    RecorderMode::Accurate
}

fn default_most_time_threshold_ms() -> usize {
    1000
}

fn default_out_threshold_count() -> usize {
    64
}

fn default_decay_ratio() -> f64 {
    1.5
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            mode: default_recorder_mode(),
            most_time_threshold_ms: default_most_time_threshold_ms(),
            out_threshold_count: default_out_threshold_count(),
            decay_ratio: default_decay_ratio(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Reporting window length
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    10
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_interval_secs() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    /// Typical request latency (ms)
    #[serde(default = "default_base_latency_ms")]
    pub base_latency_ms: u64,
    /// Uniform jitter added on top of the base latency (ms)
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    /// Percentage of samples drawn from the slow tail (0-100)
    #[serde(default = "default_outlier_pct")]
    pub outlier_pct: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_workers() -> usize {
    4
}

fn default_tags() -> Vec<String> {
    vec!["GET /api/users/:id".to_string(), "POST /api/orders".to_string()]
}

fn default_base_latency_ms() -> u64 {
    20
}

fn default_jitter_ms() -> u64 {
    80
}

fn default_outlier_pct() -> f64 {
    1.0
}

fn default_seed() -> u64 {
    1000
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            tags: default_tags(),
            base_latency_ms: default_base_latency_ms(),
            jitter_ms: default_jitter_ms(),
            outlier_pct: default_outlier_pct(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    recorder_mode: RecorderMode,
    most_time_threshold_ms: usize,
    out_threshold_count: usize,
    decay_ratio: f64,
    metrics_interval_secs: u64,
    load_workers: usize,
    load_tags: Vec<String>,
    load_base_latency_ms: u64,
    load_jitter_ms: u64,
    load_outlier_pct: f64,
    load_seed: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            recorder_mode: toml_config.recorder.mode,
            most_time_threshold_ms: toml_config.recorder.most_time_threshold_ms,
            out_threshold_count: toml_config.recorder.out_threshold_count,
            decay_ratio: toml_config.recorder.decay_ratio,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            load_workers: toml_config.load.workers,
            load_tags: toml_config.load.tags,
            load_base_latency_ms: toml_config.load.base_latency_ms,
            load_jitter_ms: toml_config.load.jitter_ms,
            load_outlier_pct: toml_config.load.outlier_pct,
            load_seed: toml_config.load.seed,
            config_file,
        }
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str, config_file: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)
            .with_context(|| format!("Failed to parse config file {}", config_file))?;

        let recorder = &toml_config.recorder;
        ensure!(recorder.most_time_threshold_ms > 0, "recorder.most_time_threshold_ms must be positive");
        ensure!(
            recorder.decay_ratio.is_finite() && recorder.decay_ratio >= 1.0,
            "recorder.decay_ratio must be >= 1.0, got {}",
            recorder.decay_ratio
        );
        ensure!(toml_config.metrics.interval_secs > 0, "metrics.interval_secs must be positive");
        ensure!(
            (0.0..=100.0).contains(&toml_config.load.outlier_pct),
            "load.outlier_pct must be between 0 and 100"
        );

        Ok(Self::from_toml(toml_config, config_file.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Load configuration from `path`, falling back to defaults on any error
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "config_fallback_to_defaults");
                Self::default()
            }
        }
    }

    /// Settings used to build every per-tag recorder
    pub fn recorder_settings(&self) -> RecorderSettings {
        RecorderSettings {
            mode: self.recorder_mode,
            threshold_ms: self.most_time_threshold_ms,
            out_threshold_count: self.out_threshold_count,
            decay_ratio: self.decay_ratio,
        }
    }

    pub fn recorder_mode(&self) -> RecorderMode {
        self.recorder_mode
    }

    pub fn most_time_threshold_ms(&self) -> usize {
        self.most_time_threshold_ms
    }

    pub fn out_threshold_count(&self) -> usize {
        self.out_threshold_count
    }

    pub fn decay_ratio(&self) -> f64 {
        self.decay_ratio
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn load_workers(&self) -> usize {
        self.load_workers
    }

    pub fn load_tags(&self) -> &[String] {
        &self.load_tags
    }

    pub fn load_base_latency_ms(&self) -> u64 {
        self.load_base_latency_ms
    }

    pub fn load_jitter_ms(&self) -> u64 {
        self.load_jitter_ms
    }

    pub fn load_outlier_pct(&self) -> f64 {
        self.load_outlier_pct
    }

    pub fn load_seed(&self) -> u64 {
        self.load_seed
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}
