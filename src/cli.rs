//! Command line interface

use crate::config::AppConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "fraud-risk-scorer",
    version,
    about = "Score transactions for fraud risk with a trained classifier"
)]
pub struct Args {
    /// Configuration file (defaults to config/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Classifier artifact, overrides model.path
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score a single transaction
    Score {
        /// Seconds elapsed since the reference epoch
        #[arg(long, allow_hyphen_values = true)]
        time: f64,
        /// Transaction amount
        #[arg(long, allow_hyphen_values = true)]
        amount: f64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Score JSON-lines transactions and write one JSON report per line
    Batch {
        /// Input file, `-` for stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,
        /// Concurrent scoring tasks, overrides pipeline.workers
        #[arg(long)]
        workers: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Args {
    /// Apply command line overrides on top of file configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model.path = model.to_string_lossy().into_owned();
        }
        if let Command::Batch {
            workers: Some(workers),
            ..
        } = &self.command
        {
            config.pipeline.workers = *workers;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score_with_negative_amount() {
        let args = Args::try_parse_from([
            "fraud-risk-scorer",
            "score",
            "--time",
            "10",
            "--amount",
            "-0.01",
        ])
        .unwrap();

        match args.command {
            Command::Score {
                time,
                amount,
                format,
            } => {
                assert_eq!(time, 10.0);
                assert_eq!(amount, -0.01);
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "fraud-risk-scorer",
            "--model",
            "models/alt.json",
            "batch",
            "--workers",
            "16",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.model.path, "models/alt.json");
        assert_eq!(config.pipeline.workers, 16);
    }
}
