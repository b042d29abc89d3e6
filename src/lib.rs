//! Fraud Risk Scorer Library
//!
//! Scores individual transactions with a pre-trained binary classifier and
//! maps the fraud probability to a fixed LOW / MEDIUM / HIGH risk tier.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod scorer;
pub mod types;

pub use batch::BatchRunner;
pub use config::AppConfig;
pub use error::{Result, ScoringError};
pub use feature_extractor::FeatureExtractor;
pub use models::{Classifier, ModelGateway};
pub use scorer::RiskScorer;
pub use types::{Label, RawTransaction, RiskTier, ScoreReport, ScoreResult, TransactionFeatures};
