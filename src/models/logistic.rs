//! Logistic regression classifier deserialized from a JSON artifact

use crate::error::{Result, ScoringError};
use crate::models::classifier::Classifier;
use crate::types::score::Label;
use serde::{Deserialize, Serialize};

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

/// Binary logistic regression over named features.
///
/// The label follows the sign of the decision value, which is the same as a
/// 0.5 cut on the probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Feature names in input order
    pub features: Vec<String>,
    /// One weight per feature
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Class values for (negative, positive); must be `[0, 1]`
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
}

impl LogisticRegression {
    pub fn new(features: Vec<String>, coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            features,
            coefficients,
            intercept,
            classes: default_classes(),
        }
    }

    /// Check internal consistency, returning a reason on failure
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("no coefficients".to_string());
        }
        if self.coefficients.len() != self.features.len() {
            return Err(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                self.features.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("non-finite model parameter".to_string());
        }
        if self.classes != [0, 1] {
            return Err(format!("expected classes [0, 1], found {:?}", self.classes));
        }
        Ok(())
    }

    /// Linear decision value `intercept + w . x`
    pub fn decision_function(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(ScoringError::inference(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();

        // Opposing terms that each overflow sum to inf - inf
        let z = if z.is_nan() {
            self.scaled_decision(features)
        } else {
            z
        };

        if z.is_nan() {
            return Err(ScoringError::inference("decision value is NaN"));
        }
        Ok(z)
    }

    /// Decision value accumulated at a 2^-1024 scale so no single product
    /// can overflow. Only the sign and magnitude class matter at this range.
    fn scaled_decision(&self, features: &[f64]) -> f64 {
        let scaled = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| (w * HALF_SCALE) * (x * HALF_SCALE))
            .sum::<f64>();

        if scaled == 0.0 {
            self.intercept
        } else {
            scaled * HALF_UNSCALE * HALF_UNSCALE + self.intercept
        }
    }
}

/// 2^-512, applied to both factors of a product
const HALF_SCALE: f64 = 1.0 / HALF_UNSCALE;
/// 2^512
const HALF_UNSCALE: f64 = 1.340_780_792_994_259_7e154;

/// Numerically stable logistic function
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_label(&self, features: &[f64]) -> Result<Label> {
        let z = self.decision_function(features)?;
        Ok(if z > 0.0 {
            Label::Fraudulent
        } else {
            Label::Legitimate
        })
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64> {
        Ok(sigmoid(self.decision_function(features)?))
    }

    fn classify(&self, features: &[f64]) -> Result<(Label, f64)> {
        let z = self.decision_function(features)?;
        let label = if z > 0.0 {
            Label::Fraudulent
        } else {
            Label::Legitimate
        };
        Ok((label, sigmoid(z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(coefficients: Vec<f64>, intercept: f64) -> LogisticRegression {
        LogisticRegression::new(
            vec!["time".to_string(), "amount".to_string()],
            coefficients,
            intercept,
        )
    }

    #[test]
    fn test_probability_at_zero_decision_is_half() {
        let lr = model(vec![0.0, 0.0], 0.0);
        let (label, p) = lr.classify(&[10.0, 10.0]).unwrap();
        assert_eq!(p, 0.5);
        // Decision value must be strictly positive to flag fraud
        assert_eq!(label, Label::Legitimate);
    }

    #[test]
    fn test_probability_is_bounded_for_extreme_inputs() {
        let lr = model(vec![1.0e-3, 5.0e-2], -6.0);
        for amount in [0.0, 1.0, 1.0e6, 1.0e300] {
            let p = lr.predict_probability(&[0.0, amount]).unwrap();
            assert!((0.0..=1.0).contains(&p), "p = {p}");
        }
        assert_eq!(lr.predict_label(&[0.0, 1.0e6]).unwrap(), Label::Fraudulent);
        assert_eq!(lr.predict_label(&[0.0, 0.0]).unwrap(), Label::Legitimate);
    }

    #[test]
    fn test_overflowing_terms_still_score() {
        // w . x overflows to +inf and -inf term by term
        let lr = model(vec![2.0, -3.0], 0.0);
        let (label, p) = lr.classify(&[1.0e308, 1.0e308]).unwrap();
        assert_eq!(label, Label::Legitimate);
        assert_eq!(p, 0.0);

        let lr = model(vec![-2.0, 3.0], 0.0);
        let (label, p) = lr.classify(&[1.0e308, 1.0e308]).unwrap();
        assert_eq!(label, Label::Fraudulent);
        assert_eq!(p, 1.0);

        // Exact cancellation falls back to the intercept
        let lr = model(vec![2.0, -2.0], 0.0);
        assert_eq!(lr.decision_function(&[1.0e308, 1.0e308]).unwrap(), 0.0);
        let (label, p) = lr.classify(&[1.0e308, 1.0e308]).unwrap();
        assert_eq!(label, Label::Legitimate);
        assert_eq!(p, 0.5);
    }

    #[test]
    fn test_dimension_mismatch_is_inference_error() {
        let lr = model(vec![0.1, 0.2], 0.0);
        let err = lr.predict_probability(&[1.0]).unwrap_err();
        assert!(matches!(err, ScoringError::InferenceError(_)));
    }

    #[test]
    fn test_check_rejects_inconsistent_models() {
        assert!(model(vec![0.1, 0.2], 0.0).check().is_ok());
        assert!(model(vec![0.1], 0.0).check().is_err());
        assert!(model(vec![0.1, f64::INFINITY], 0.0).check().is_err());

        let mut wrong_classes = model(vec![0.1, 0.2], 0.0);
        wrong_classes.classes = vec![1, 0];
        assert!(wrong_classes.check().is_err());
    }
}
