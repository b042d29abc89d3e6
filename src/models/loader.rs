//! Classifier artifact loader

use crate::error::{Result, ScoringError};
use crate::feature_extractor::{FEATURE_COUNT, FEATURE_NAMES};
use crate::models::classifier::Classifier;
use crate::models::logistic::LogisticRegression;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Serialized form of a JSON classifier artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactSpec {
    LogisticRegression(LogisticRegression),
}

/// On-disk artifact encoding, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Onnx,
}

impl ArtifactFormat {
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => ArtifactFormat::Onnx,
            _ => ArtifactFormat::Json,
        }
    }
}

/// Loader for classifier artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load a classifier artifact.
    ///
    /// Either returns a fully constructed classifier or an error; nothing is
    /// cached on failure.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<dyn Classifier>> {
        let path = path.as_ref();
        let format = ArtifactFormat::detect(path);

        info!(path = %path.display(), format = ?format, "Loading classifier artifact");

        match format {
            ArtifactFormat::Json => self.load_json(path),
            ArtifactFormat::Onnx => self.load_onnx(path),
        }
    }

    fn load_json(&self, path: &Path) -> Result<Arc<dyn Classifier>> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ScoringError::ArtifactNotFound {
                path: path.to_path_buf(),
            },
            _ => ScoringError::corrupt(path, e),
        })?;

        let spec: ArtifactSpec =
            serde_json::from_slice(&bytes).map_err(|e| ScoringError::corrupt(path, e))?;

        match spec {
            ArtifactSpec::LogisticRegression(model) => {
                model
                    .check()
                    .and_then(|()| check_feature_names(&model.features))
                    .map_err(|reason| ScoringError::corrupt(path, reason))?;
                info!(
                    path = %path.display(),
                    features = ?model.features,
                    "Logistic regression artifact loaded"
                );
                Ok(Arc::new(model))
            }
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path) -> Result<Arc<dyn Classifier>> {
        use crate::models::onnx::OnnxClassifier;

        if !path.exists() {
            return Err(ScoringError::ArtifactNotFound {
                path: path.to_path_buf(),
            });
        }
        let classifier = OnnxClassifier::load(path, self.onnx_threads)?;
        Ok(Arc::new(classifier))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path) -> Result<Arc<dyn Classifier>> {
        if !path.exists() {
            return Err(ScoringError::ArtifactNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(ScoringError::corrupt(
            path,
            format!(
                "ONNX artifacts need the `onnx` feature ({FEATURE_COUNT}-feature model, {} threads requested)",
                self.onnx_threads
            ),
        ))
    }
}

/// Artifact features must line up with the extractor's column order.
///
/// When the widths differ, the shared positions must still match; the width
/// itself is reported on every `classify` call.
fn check_feature_names(features: &[String]) -> std::result::Result<(), String> {
    let misplaced = features
        .iter()
        .zip(FEATURE_NAMES)
        .position(|(found, expected)| found != expected);

    match misplaced {
        Some(i) => Err(format!(
            "feature {i} is {:?}, expected {:?} (artifact features {features:?}, expected {FEATURE_NAMES:?})",
            features[i], FEATURE_NAMES[i]
        )),
        None => Ok(()),
    }
}

/// Input width declared by a tensor shape, if its last dimension is fixed
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
pub(crate) fn declared_width(dims: &[i64]) -> Option<usize> {
    dims.last()
        .copied()
        .filter(|&d| d > 0)
        .and_then(|d| usize::try_from(d).ok())
}

/// Resolve a binary artifact's input width against the extractor's.
///
/// A fixed width other than `FEATURE_COUNT` is corrupt; a dynamic width is
/// taken as `FEATURE_COUNT`.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
pub(crate) fn resolve_width(path: &Path, declared: Option<usize>) -> Result<usize> {
    match declared {
        Some(width) if width != FEATURE_COUNT => Err(ScoringError::corrupt(
            path,
            format!("model input takes {width} features, expected {FEATURE_COUNT}"),
        )),
        Some(width) => Ok(width),
        None => Ok(FEATURE_COUNT),
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}
