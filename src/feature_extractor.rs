//! Feature extraction for classifier inference.
//!
//! The classifier was trained on two ordered columns, `time` then `amount`.
//! This module is the single place that fixes that order.

use crate::types::transaction::TransactionFeatures;

/// Number of features every classifier must accept
pub const FEATURE_COUNT: usize = 2;

/// Feature names in model input order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["time", "amount"];

/// Turns validated transaction features into a model input vector.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature vector in training order.
    pub fn extract(&self, features: &TransactionFeatures) -> [f64; FEATURE_COUNT] {
        [features.time(), features.amount()]
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order() {
        let extractor = FeatureExtractor::new();
        let features = TransactionFeatures::new(100000.0, 100.50).unwrap();

        let vector = extractor.extract(&features);

        assert_eq!(vector, [100000.0, 100.50]);
        assert_eq!(extractor.feature_names(), &["time", "amount"]);
        assert_eq!(extractor.feature_count(), vector.len());
    }
}
