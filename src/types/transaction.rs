//! Transaction data structures for fraud risk scoring

use crate::error::{InputField, InputViolation, Result, ScoringError};
use serde::{Deserialize, Serialize};

/// Validated feature pair for a single transaction.
///
/// Fields are private so a value of this type always holds finite,
/// non-negative numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransactionFeatures {
    /// Seconds elapsed since the reference epoch
    time: f64,
    /// Monetary value in the fixed currency unit
    amount: f64,
}

impl TransactionFeatures {
    /// Build features from present values, rejecting negative or non-finite ones
    pub fn new(time: f64, amount: f64) -> Result<Self> {
        Self::validate(Some(time), Some(amount))
    }

    /// Validate raw, possibly missing, values. `time` is checked first.
    pub fn validate(raw_time: Option<f64>, raw_amount: Option<f64>) -> Result<Self> {
        let time = check_field(InputField::Time, raw_time)?;
        let amount = check_field(InputField::Amount, raw_amount)?;
        Ok(Self { time, amount })
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

fn check_field(field: InputField, raw: Option<f64>) -> Result<f64> {
    let violation = match raw {
        None => InputViolation::Missing,
        Some(v) if !v.is_finite() => InputViolation::NonFinite(v),
        Some(v) if v < 0.0 => InputViolation::Negative(v),
        Some(v) => return Ok(v),
    };
    Err(ScoringError::InvalidInput { field, violation })
}

/// Unvalidated scoring request as read from batch input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Caller-supplied identifier, echoed into the score report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Seconds since the reference epoch
    #[serde(default, alias = "Time")]
    pub time: Option<f64>,

    /// Transaction amount
    #[serde(default, alias = "Amount")]
    pub amount: Option<f64>,
}

impl RawTransaction {
    pub fn new(time: f64, amount: f64) -> Self {
        Self {
            transaction_id: None,
            time: Some(time),
            amount: Some(amount),
        }
    }

    pub fn with_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn validate(&self) -> Result<TransactionFeatures> {
        TransactionFeatures::validate(self.time, self.amount)
    }
}
