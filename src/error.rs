//! Error taxonomy for the scoring engine

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Input field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Time,
    Amount,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputField::Time => f.write_str("time"),
            InputField::Amount => f.write_str("amount"),
        }
    }
}

/// Why a raw input value was rejected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputViolation {
    Missing,
    NonFinite(f64),
    Negative(f64),
}

impl fmt::Display for InputViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputViolation::Missing => f.write_str("value is missing"),
            InputViolation::NonFinite(v) => write!(f, "value must be finite, got {v}"),
            InputViolation::Negative(v) => write!(f, "value must be non-negative, got {v}"),
        }
    }
}

/// Errors raised while loading a classifier or scoring a transaction.
///
/// Artifact and inference errors are fatal: the process must not keep
/// serving with a missing model or a broken feature contract. Invalid input
/// only rejects the single call that carried it.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("model artifact not found at {}", .path.display())]
    ArtifactNotFound { path: PathBuf },

    #[error("model artifact at {} is corrupt: {reason}", .path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("invalid {field}: {violation}")]
    InvalidInput {
        field: InputField,
        violation: InputViolation,
    },

    #[error("inference failed: {0}")]
    InferenceError(String),
}

impl ScoringError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        ScoringError::ArtifactCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn inference(reason: impl fmt::Display) -> Self {
        ScoringError::InferenceError(reason.to_string())
    }

    /// True for errors that mean the engine itself is unusable.
    pub fn is_fatal(&self) -> bool {
        !self.is_invalid_input()
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ScoringError::InvalidInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message_names_field_and_reason() {
        let err = ScoringError::InvalidInput {
            field: InputField::Amount,
            violation: InputViolation::Negative(-0.01),
        };
        assert_eq!(
            err.to_string(),
            "invalid amount: value must be non-negative, got -0.01"
        );
        assert!(err.is_invalid_input());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_artifact_errors_are_fatal() {
        let err = ScoringError::ArtifactNotFound {
            path: PathBuf::from("fraud_model.json"),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("fraud_model.json"));

        assert!(ScoringError::inference("dimension mismatch").is_fatal());
    }
}
