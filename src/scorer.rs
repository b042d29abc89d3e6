//! Risk scorer: validation, classification and tiering

use crate::error::Result;
use crate::models::gateway::ModelGateway;
use crate::types::score::ScoreResult;
use crate::types::transaction::{RawTransaction, TransactionFeatures};
use tracing::debug;

/// Stateless scorer over a shared model gateway.
#[derive(Clone)]
pub struct RiskScorer {
    gateway: ModelGateway,
}

impl RiskScorer {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    /// Validate raw inputs into transaction features
    pub fn validate(raw_time: Option<f64>, raw_amount: Option<f64>) -> Result<TransactionFeatures> {
        TransactionFeatures::validate(raw_time, raw_amount)
    }

    /// Score validated features
    pub fn score(&self, features: &TransactionFeatures) -> Result<ScoreResult> {
        let (label, probability) = self.gateway.classify(features)?;
        let result = ScoreResult::new(label, probability)?;

        debug!(
            time = features.time(),
            amount = features.amount(),
            label = %result.label(),
            fraud_probability = result.fraud_probability(),
            risk_tier = %result.risk_tier(),
            "Transaction scored"
        );

        Ok(result)
    }

    /// Validate and score in one call
    pub fn score_raw(&self, raw_time: Option<f64>, raw_amount: Option<f64>) -> Result<ScoreResult> {
        let features = Self::validate(raw_time, raw_amount)?;
        self.score(&features)
    }

    /// Score a batch sequentially, one independent result per input, in order
    pub fn score_batch(&self, batch: &[RawTransaction]) -> Vec<Result<ScoreResult>> {
        batch
            .iter()
            .map(|raw| self.score_raw(raw.time, raw.amount))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InputField, ScoringError};
    use crate::models::classifier::Classifier;
    use crate::models::logistic::LogisticRegression;
    use crate::types::score::{Label, RiskTier};
    use std::sync::Arc;

    /// Returns a fixed label and probability for every input
    struct FixedClassifier {
        label: Label,
        probability: f64,
    }

    impl Classifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn feature_count(&self) -> usize {
            2
        }

        fn predict_label(&self, _features: &[f64]) -> crate::error::Result<Label> {
            Ok(self.label)
        }

        fn predict_probability(&self, _features: &[f64]) -> crate::error::Result<f64> {
            Ok(self.probability)
        }
    }

    /// Reports 0.85 / fraudulent for (100000, 100.50) and 0.05 otherwise
    struct KnownTransactionClassifier;

    impl Classifier for KnownTransactionClassifier {
        fn name(&self) -> &str {
            "known"
        }

        fn feature_count(&self) -> usize {
            2
        }

        fn predict_label(&self, features: &[f64]) -> crate::error::Result<Label> {
            Ok(if features == [100000.0, 100.50] {
                Label::Fraudulent
            } else {
                Label::Legitimate
            })
        }

        fn predict_probability(&self, features: &[f64]) -> crate::error::Result<f64> {
            Ok(if features == [100000.0, 100.50] { 0.85 } else { 0.05 })
        }
    }

    fn fixed(label: Label, probability: f64) -> RiskScorer {
        RiskScorer::new(ModelGateway::from_classifier(Arc::new(FixedClassifier {
            label,
            probability,
        })))
    }

    fn logistic() -> RiskScorer {
        let model = LogisticRegression::new(
            vec!["time".into(), "amount".into()],
            vec![-1.0e-5, 2.0e-3],
            -1.5,
        );
        RiskScorer::new(ModelGateway::from_classifier(Arc::new(model)))
    }

    #[test]
    fn test_threshold_boundaries() {
        let features = TransactionFeatures::new(1.0, 1.0).unwrap();

        let high = fixed(Label::Legitimate, 0.70).score(&features).unwrap();
        assert_eq!(high.risk_tier(), RiskTier::High);

        let medium = fixed(Label::Legitimate, 0.40).score(&features).unwrap();
        assert_eq!(medium.risk_tier(), RiskTier::Medium);

        let low = fixed(Label::Legitimate, 0.399_999_999_9).score(&features).unwrap();
        assert_eq!(low.risk_tier(), RiskTier::Low);
    }

    #[test]
    fn test_label_is_not_derived_from_tier() {
        let features = TransactionFeatures::new(1.0, 1.0).unwrap();

        let result = fixed(Label::Fraudulent, 0.55).score(&features).unwrap();
        assert_eq!(result.label(), Label::Fraudulent);
        assert_eq!(result.risk_tier(), RiskTier::Medium);

        let result = fixed(Label::Legitimate, 0.9).score(&features).unwrap();
        assert_eq!(result.label(), Label::Legitimate);
        assert_eq!(result.risk_tier(), RiskTier::High);
    }

    #[test]
    fn test_end_to_end_known_transaction() {
        let scorer = RiskScorer::new(ModelGateway::from_classifier(Arc::new(
            KnownTransactionClassifier,
        )));

        let result = scorer.score_raw(Some(100000.0), Some(100.50)).unwrap();

        assert_eq!(result, ScoreResult::new(Label::Fraudulent, 0.85).unwrap());
        assert_eq!(result.label(), Label::Fraudulent);
        assert_eq!(result.fraud_probability(), 0.85);
        assert_eq!(result.risk_tier(), RiskTier::High);
    }

    #[test]
    fn test_valid_inputs_produce_consistent_results() {
        let scorer = logistic();
        for time in [0.0, 406.0, 86_400.0, 172_792.0] {
            for amount in [0.0, 0.01, 100.50, 2_125.87, 25_691.16, 1.0e9] {
                let result = scorer.score_raw(Some(time), Some(amount)).unwrap();
                let p = result.fraud_probability();
                assert!((0.0..=1.0).contains(&p));
                assert_eq!(result.risk_tier(), RiskTier::from_probability(p));
            }
        }
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let scorer = logistic();
        let features = TransactionFeatures::new(5_000.0, 750.0).unwrap();
        assert_eq!(
            scorer.score(&features).unwrap(),
            scorer.score(&features).unwrap()
        );
    }

    #[test]
    fn test_invalid_input_is_rejected_not_coerced() {
        let scorer = logistic();

        for (time, amount, field) in [
            (Some(-1.0), Some(50.0), InputField::Time),
            (Some(10.0), Some(-0.01), InputField::Amount),
            (None, Some(1.0), InputField::Time),
        ] {
            match scorer.score_raw(time, amount) {
                Err(ScoringError::InvalidInput { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected invalid input, got {other:?}"),
            }
        }

        assert!(RiskScorer::validate(Some(0.0), Some(0.0)).is_ok());
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let scorer = logistic();
        let batch = vec![
            RawTransaction::new(10.0, 20.0),
            RawTransaction::new(10.0, -20.0),
            RawTransaction::new(100000.0, 100.50),
        ];

        let results = scorer.score_batch(&batch);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ScoringError::InvalidInput { .. })));
        assert_eq!(
            results[2].as_ref().unwrap(),
            &scorer.score_raw(Some(100000.0), Some(100.50)).unwrap()
        );
    }

    #[test]
    fn test_concurrent_scoring_matches_sequential() {
        let scorer = logistic();
        let inputs: Vec<(f64, f64)> = (0..64)
            .map(|i| (i as f64 * 1_000.0, i as f64 * 37.5))
            .collect();
        let sequential: Vec<ScoreResult> = inputs
            .iter()
            .map(|&(t, a)| scorer.score_raw(Some(t), Some(a)).unwrap())
            .collect();

        let concurrent: Vec<ScoreResult> = std::thread::scope(|s| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|&(t, a)| {
                    let scorer = &scorer;
                    s.spawn(move || scorer.score_raw(Some(t), Some(a)).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(sequential, concurrent);
    }
}
