//! Serializable report configuration.

use crate::scoring::ScoreWeights;
use pairlab_core::MetricOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a report run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a single report run.
///
/// Everything needed to reproduce a run is captured here: the input file,
/// filters, combination caps, the capital target, and the score weights.
/// Two runs with identical configs share the same [`RunId`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// Positions CSV file to analyze.
    pub positions_file: PathBuf,

    /// Optional case-insensitive filter on the `Type` column (e.g. "long").
    #[serde(default)]
    pub position_type: Option<String>,

    /// Directory the report artifacts are written to (created if absent).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Pairs removed from the ranked list before combinations are built.
    #[serde(default)]
    pub excluded_pairs: Vec<String>,

    /// Cap on how many top-ranked pairs combination rows may cover.
    #[serde(default = "default_max_combination_rows")]
    pub max_combination_rows: usize,

    /// Target capital per trade for the capital-invariant rescale.
    #[serde(default = "default_capital_per_trade")]
    pub capital_per_trade: f64,

    /// Per-missing-month score decay multiplier.
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,

    /// Grid steps for drawdown and concurrency sampling.
    #[serde(default)]
    pub metrics: MetricOptions,

    /// Weight per metric column for the composite score.
    #[serde(default)]
    pub score_weights: ScoreWeights,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("report_outputs")
}

fn default_max_combination_rows() -> usize {
    30
}

fn default_capital_per_trade() -> f64 {
    100.0
}

fn default_decay_factor() -> f64 {
    0.75
}

impl ReportConfig {
    /// A config with defaults for everything except the positions file.
    pub fn new(positions_file: impl Into<PathBuf>) -> Self {
        Self {
            positions_file: positions_file.into(),
            position_type: None,
            output_dir: default_output_dir(),
            excluded_pairs: Vec::new(),
            max_combination_rows: default_max_combination_rows(),
            capital_per_trade: default_capital_per_trade(),
            decay_factor: default_decay_factor(),
            metrics: MetricOptions::default(),
            score_weights: ScoreWeights::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the numeric knobs before any computation starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_combination_rows == 0 {
            return Err(ConfigError::Invalid(
                "max_combination_rows must be at least 1".into(),
            ));
        }
        if !(self.capital_per_trade > 0.0) {
            return Err(ConfigError::Invalid(
                "capital_per_trade must be positive".into(),
            ));
        }
        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            return Err(ConfigError::Invalid(
                "decay_factor must be in (0, 1]".into(),
            ));
        }
        if self.metrics.equity_step_minutes == 0 || self.metrics.concurrency_step_minutes == 0 {
            return Err(ConfigError::Invalid("grid steps must be non-zero".into()));
        }
        Ok(())
    }

    /// Deterministic content hash for this configuration.
    ///
    /// Identical configs produce identical ids, which ties a run's
    /// artifacts back to the exact parameters that produced them.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("ReportConfig serialization failed");
        let hash = blake3::hash(json.as_bytes());
        hash.to_hex().to_string()
    }
}
