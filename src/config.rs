//! Configuration management for the risk scoring engine.
//!
//! Risk tier thresholds are deliberately not configurable.

use anyhow::{bail, Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Default artifact location
pub const DEFAULT_MODEL_PATH: &str = "fraud_model.json";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path of the serialized classifier
    pub path: String,
    /// Number of threads for ONNX inference (default: 1)
    pub onnx_threads: usize,
}

/// Batch pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent scoring tasks
    pub workers: usize,
    /// Seconds between metrics summaries during long batches
    pub metrics_interval_secs: u64,
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl AppConfig {
    /// Load `config/config.toml` if present, otherwise built-in defaults
    pub fn load() -> Result<Self> {
        Self::build(Path::new(DEFAULT_CONFIG_PATH), false)
    }

    /// Load configuration from a file that must exist
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(path.as_ref(), true)
    }

    fn build(path: &Path, required: bool) -> Result<Self> {
        let config = Config::builder()
            .set_default("model.path", DEFAULT_MODEL_PATH)?
            .set_default("model.onnx_threads", 1_i64)?
            .set_default("pipeline.workers", 4_i64)?
            .set_default("pipeline.metrics_interval_secs", 30_i64)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::from(path).required(required))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would leave the engine unusable
    pub fn validate(&self) -> Result<()> {
        if self.model.path.trim().is_empty() {
            bail!("model.path must not be empty");
        }
        if self.pipeline.workers == 0 {
            bail!("pipeline.workers must be at least 1");
        }
        if self.model.onnx_threads == 0 {
            bail!("model.onnx_threads must be at least 1");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                path: DEFAULT_MODEL_PATH.to_string(),
                onnx_threads: 1,
            },
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}
