//! Capability interface every loaded classifier exposes

use crate::error::Result;
use crate::types::score::Label;

/// A trained binary classifier over an ordered feature vector.
///
/// Implementations must be read-only after construction so one instance can
/// serve any number of concurrent callers.
pub trait Classifier: Send + Sync {
    /// Human readable identifier used in logs
    fn name(&self) -> &str;

    /// Number of features the classifier was trained on
    fn feature_count(&self) -> usize;

    /// The classifier's own discrete decision
    fn predict_label(&self, features: &[f64]) -> Result<Label>;

    /// Probability of the fraud class
    fn predict_probability(&self, features: &[f64]) -> Result<f64>;

    /// Label and probability together. Backends that produce both from one
    /// inference pass override this.
    fn classify(&self, features: &[f64]) -> Result<(Label, f64)> {
        Ok((
            self.predict_label(features)?,
            self.predict_probability(features)?,
        ))
    }
}
