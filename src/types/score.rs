//! Score result data structures

use crate::error::{Result, ScoringError};
use crate::types::transaction::TransactionFeatures;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability at or above which a transaction is HIGH risk
pub const HIGH_RISK_THRESHOLD: f64 = 0.70;

/// Probability at or above which a transaction is at least MEDIUM risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.40;

/// Classifier's own binary decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Legitimate,
    Fraudulent,
}

impl Label {
    /// Map a class index (0 = legitimate, 1 = fraudulent)
    pub fn from_class(class: i64) -> Option<Self> {
        match class {
            0 => Some(Label::Legitimate),
            1 => Some(Label::Fraudulent),
            _ => None,
        }
    }

    /// One-line verdict for plain text rendering
    pub fn verdict(&self) -> &'static str {
        match self {
            Label::Legitimate => "TRANSACTION SAFE",
            Label::Fraudulent => "FRAUD DETECTED",
        }
    }

    /// Analysis summary sentence for plain text rendering
    pub fn summary(&self) -> &'static str {
        match self {
            Label::Legitimate => "Transaction aligns with expected customer spending behavior.",
            Label::Fraudulent => {
                "Transaction deviates from normal spending patterns and matches known fraud indicators."
            }
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Legitimate => f.write_str("LEGITIMATE"),
            Label::Fraudulent => f.write_str("FRAUDULENT"),
        }
    }
}

/// Risk tier derived from fraud probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    /// Determine the tier from a fraud probability.
    ///
    /// Checked top-down with inclusive lower bounds, so 0.70 is HIGH and
    /// 0.40 is MEDIUM.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            RiskTier::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            RiskTier::Low => 0,
            RiskTier::Medium => 1,
            RiskTier::High => 2,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => f.write_str("LOW"),
            RiskTier::Medium => f.write_str("MEDIUM"),
            RiskTier::High => f.write_str("HIGH"),
        }
    }
}

/// Outcome of scoring one transaction.
///
/// The tier is always computed from the probability; the label is whatever
/// the classifier decided and is never reconciled with the tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    label: Label,
    fraud_probability: f64,
    risk_tier: RiskTier,
}

impl ScoreResult {
    /// Build a result, rejecting probabilities that are not finite or fall
    /// outside [0, 1]
    pub fn new(label: Label, fraud_probability: f64) -> Result<Self> {
        if !fraud_probability.is_finite() || !(0.0..=1.0).contains(&fraud_probability) {
            return Err(ScoringError::inference(format!(
                "fraud probability {fraud_probability} outside [0, 1]"
            )));
        }
        Ok(Self {
            label,
            fraud_probability,
            risk_tier: RiskTier::from_probability(fraud_probability),
        })
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn fraud_probability(&self) -> f64 {
        self.fraud_probability
    }

    pub fn risk_tier(&self) -> RiskTier {
        self.risk_tier
    }

    pub fn probability_percent(&self) -> f64 {
        self.fraud_probability * 100.0
    }
}

/// Batch output envelope around a score result
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    /// Unique report identifier
    pub report_id: String,

    /// Caller-supplied transaction identifier; never generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    pub time: f64,
    pub amount: f64,

    #[serde(flatten)]
    pub result: ScoreResult,

    pub scored_at: DateTime<Utc>,
}

impl ScoreReport {
    pub fn new(
        transaction_id: Option<String>,
        features: &TransactionFeatures,
        result: ScoreResult,
    ) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            transaction_id,
            time: features.time(),
            amount: features.amount(),
            result,
            scored_at: Utc::now(),
        }
    }
}
