//! Pipeline configuration.
//!
//! Uses `figment` for layered configuration: defaults -> TOML file ->
//! environment. The resulting `PipelineConfig` is built once at run start
//! and threaded immutably through every stage; there is no process-wide
//! configuration state.

use crate::data::DataSourceConfig;
use crate::error::PipelineError;
use crate::gate::MetricOrientation;
use crate::model::metrics::GateMetric;
use crate::model::TrainParams;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where raw records are fetched from.
    #[serde(default = "default_source")]
    pub source: DataSourceConfig,
    /// Path of the schema spec JSON file.
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,
    /// Root directory for artifact records and blobs.
    #[serde(default = "default_artifact_root")]
    pub artifact_root: PathBuf,
    /// Path of the model registry JSON file.
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
    /// Column the classifier predicts.
    #[serde(default = "default_target_column")]
    pub target_column: String,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub training: TrainParams,
    #[serde(default)]
    pub gate: GateConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            schema_path: default_schema_path(),
            artifact_root: default_artifact_root(),
            registry_path: default_registry_path(),
            target_column: default_target_column(),
            split: SplitConfig::default(),
            validation: ValidationConfig::default(),
            training: TrainParams::default(),
            gate: GateConfig::default(),
        }
    }
}

fn default_source() -> DataSourceConfig {
    DataSourceConfig::Csv {
        path: PathBuf::from("data/records.csv"),
        delimiter: ',',
    }
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.json")
}

fn default_artifact_root() -> PathBuf {
    PathBuf::from(".trainyard/artifacts")
}

fn default_registry_path() -> PathBuf {
    PathBuf::from(".trainyard/registry.json")
}

fn default_target_column() -> String {
    "label".to_string()
}

/// Train/test partitioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows assigned to the training partition.
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    /// Seed for the partition shuffle.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: default_train_fraction(),
            seed: default_seed(),
        }
    }
}

fn default_train_fraction() -> f64 {
    0.8
}

fn default_seed() -> u64 {
    42
}

/// Validation stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum tolerated per-column null ratio.
    #[serde(default = "default_null_ratio_tolerance")]
    pub null_ratio_tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            null_ratio_tolerance: default_null_ratio_tolerance(),
        }
    }
}

fn default_null_ratio_tolerance() -> f64 {
    0.1
}

/// Evaluation gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Which held-out metric gates promotion.
    #[serde(default = "default_gate_metric")]
    pub metric: GateMetric,
    /// Non-negative improvement margin required over the baseline.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_orientation")]
    pub orientation: MetricOrientation,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            metric: default_gate_metric(),
            threshold: default_threshold(),
            orientation: default_orientation(),
        }
    }
}

fn default_gate_metric() -> GateMetric {
    GateMetric::Accuracy
}

fn default_threshold() -> f64 {
    0.02
}

fn default_orientation() -> MetricOrientation {
    MetricOrientation::HigherIsBetter
}

impl PipelineConfig {
    /// Check invariants that must hold before any stage runs.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.split.train_fraction > 0.0 && self.split.train_fraction < 1.0) {
            return Err(PipelineError::config(format!(
                "split.train_fraction {} must be in (0, 1)",
                self.split.train_fraction
            )));
        }
        if self.gate.threshold < 0.0 {
            return Err(PipelineError::config(format!(
                "gate.threshold {} must be non-negative",
                self.gate.threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.validation.null_ratio_tolerance) {
            return Err(PipelineError::config(format!(
                "validation.null_ratio_tolerance {} must be in [0, 1]",
                self.validation.null_ratio_tolerance
            )));
        }
        if self.training.learning_rate <= 0.0 {
            return Err(PipelineError::config(format!(
                "training.learning_rate {} must be positive",
                self.training.learning_rate
            )));
        }
        if self.training.epochs == 0 {
            return Err(PipelineError::config("training.epochs must be positive"));
        }
        if self.target_column.is_empty() {
            return Err(PipelineError::config("target_column must not be empty"));
        }
        Ok(())
    }
}

/// Load configuration with layering: defaults -> optional TOML file ->
/// `TRAINYARD_`-prefixed environment variables (`__` as section separator).
pub fn load_config(config_file: Option<&Path>) -> Result<PipelineConfig, PipelineError> {
    let mut figment = Figment::from(Serialized::defaults(PipelineConfig::default()));
    if let Some(path) = config_file {
        if !path.exists() {
            return Err(PipelineError::config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed("TRAINYARD_").split("__"));

    let config: PipelineConfig = figment
        .extract()
        .map_err(|e| PipelineError::config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
