//! Type definitions for the risk scoring engine

pub mod score;
pub mod transaction;

pub use score::{Label, RiskTier, ScoreReport, ScoreResult};
pub use transaction::{RawTransaction, TransactionFeatures};
