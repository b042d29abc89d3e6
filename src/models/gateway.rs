//! Model gateway: owns the loaded classifier and guards the feature contract

use crate::error::{Result, ScoringError};
use crate::feature_extractor::{FeatureExtractor, FEATURE_COUNT};
use crate::models::classifier::Classifier;
use crate::models::loader::ModelLoader;
use crate::types::score::Label;
use crate::types::transaction::TransactionFeatures;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Handle to a loaded, immutable classifier.
///
/// Cloning is cheap and shares the same classifier, so one handle created at
/// startup can be passed to every scoring task.
#[derive(Clone)]
pub struct ModelGateway {
    classifier: Arc<dyn Classifier>,
    extractor: Arc<FeatureExtractor>,
}

impl ModelGateway {
    /// Load an artifact with default loader settings
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(&ModelLoader::default(), path)
    }

    /// Load an artifact with a configured loader
    pub fn load_with<P: AsRef<Path>>(loader: &ModelLoader, path: P) -> Result<Self> {
        let path = path.as_ref();
        let classifier = loader.load(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load classifier artifact");
            e
        })?;

        info!(
            path = %path.display(),
            classifier = %classifier.name(),
            features = classifier.feature_count(),
            "Model gateway ready"
        );

        Ok(Self::from_classifier(classifier))
    }

    /// Wrap an already constructed classifier
    pub fn from_classifier(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            extractor: Arc::new(FeatureExtractor::new()),
        }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Predict the label and fraud probability for validated features.
    pub fn classify(&self, features: &TransactionFeatures) -> Result<(Label, f64)> {
        let expected = self.classifier.feature_count();
        if expected != FEATURE_COUNT {
            error!(
                classifier = %self.classifier.name(),
                expected,
                provided = FEATURE_COUNT,
                "Classifier feature count does not match transaction features"
            );
            return Err(ScoringError::inference(format!(
                "classifier {} expects {} features, transactions provide {}",
                self.classifier.name(),
                expected,
                FEATURE_COUNT
            )));
        }

        let vector = self.extractor.extract(features);
        let (label, probability) = self.classifier.classify(&vector)?;

        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            error!(
                classifier = %self.classifier.name(),
                probability,
                "Classifier produced an invalid probability"
            );
            return Err(ScoringError::inference(format!(
                "classifier {} returned probability {} outside [0, 1]",
                self.classifier.name(),
                probability
            )));
        }

        debug!(
            classifier = %self.classifier.name(),
            label = %label,
            probability,
            "Classification complete"
        );

        Ok((label, probability))
    }
}
