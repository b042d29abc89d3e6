//! ONNX Runtime backed classifier (requires the `onnx` feature)

use crate::error::{Result, ScoringError};
use crate::models::classifier::Classifier;
use crate::models::loader::{declared_width, resolve_width};
use crate::types::score::Label;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier exported to ONNX, e.g. a scikit-learn pipeline via skl2onnx.
pub struct OnnxClassifier {
    name: String,
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    probability_output: String,
    label_output: Option<String>,
    feature_count: usize,
}

impl OnnxClassifier {
    /// Load an ONNX model, resolving its input width and output names
    pub fn load(path: &Path, onnx_threads: usize) -> Result<Self> {
        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX classifier");

        let session = Session::builder()
            .map_err(|e| ScoringError::corrupt(path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ScoringError::corrupt(path, e))?
            .with_intra_threads(onnx_threads)
            .map_err(|e| ScoringError::corrupt(path, e))?
            .commit_from_file(path)
            .map_err(|e| ScoringError::corrupt(path, e))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| ScoringError::corrupt(path, "model declares no inputs"))?;
        let input_name = input.name.clone();

        let dims: Vec<i64> = input
            .input_type
            .tensor_shape()
            .map(|shape| shape.iter().copied().collect())
            .unwrap_or_default();
        let feature_count = resolve_width(path, declared_width(&dims))?;

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.iter().find(|o| !o.name.contains("label")))
            .map(|o| o.name.clone())
            .ok_or_else(|| ScoringError::corrupt(path, "model declares no probability output"))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(
            model = %name,
            input = %input_name,
            input_shape = ?dims,
            feature_count,
            probabilities = %probability_output,
            label = ?label_output,
            "ONNX classifier loaded"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_name,
            probability_output,
            label_output,
            feature_count,
        })
    }

    fn extract_probability(&self, outputs: &SessionOutputs) -> Result<f64> {
        let output = outputs.get(self.probability_output.as_str()).ok_or_else(|| {
            ScoringError::inference(format!("missing output {}", self.probability_output))
        })?;

        // Tensor output: [batch, classes] or [batch, 1]
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let classes = dims.last().copied().unwrap_or(0);
            let value = match classes {
                c if c >= 2 => data.get(1),
                1 => data.first(),
                _ => None,
            };
            return value
                .map(|&p| p as f64)
                .ok_or_else(|| ScoringError::inference(format!("unexpected output shape {dims:?}")));
        }

        // ZipMap output: seq(map(int64, float))
        self.extract_from_sequence_map(output)
    }

    fn extract_from_sequence_map(&self, output: &DynValue) -> Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(ScoringError::inference)?;
        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(ScoringError::inference)?;
        let first = maps
            .first()
            .ok_or_else(|| ScoringError::inference("empty probability sequence"))?;
        let pairs = first
            .try_extract_key_values::<i64, f32>()
            .map_err(ScoringError::inference)?;

        pairs
            .iter()
            .find(|(class, _)| *class == 1)
            .map(|(_, p)| *p as f64)
            .ok_or_else(|| ScoringError::inference("no probability for class 1"))
    }

    fn extract_label(&self, outputs: &SessionOutputs) -> Result<Option<Label>> {
        let Some(name) = &self.label_output else {
            return Ok(None);
        };
        let Some(output) = outputs.get(name.as_str()) else {
            return Ok(None);
        };
        let (_, data) = output
            .try_extract_tensor::<i64>()
            .map_err(ScoringError::inference)?;
        let class = data
            .first()
            .copied()
            .ok_or_else(|| ScoringError::inference("empty label output"))?;
        Label::from_class(class)
            .map(Some)
            .ok_or_else(|| ScoringError::inference(format!("unknown class {class}")))
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn predict_label(&self, features: &[f64]) -> Result<Label> {
        self.classify(features).map(|(label, _)| label)
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64> {
        self.classify(features).map(|(_, p)| p)
    }

    fn classify(&self, features: &[f64]) -> Result<(Label, f64)> {
        let shape = vec![1_i64, features.len() as i64];
        let input: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let tensor = Tensor::from_array((shape, input)).map_err(ScoringError::inference)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ScoringError::inference("ONNX session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![&self.input_name => tensor])
            .map_err(ScoringError::inference)?;

        let probability = self.extract_probability(&outputs)?;
        let label = match self.extract_label(&outputs)? {
            Some(label) => label,
            None if probability > 0.5 => Label::Fraudulent,
            None => Label::Legitimate,
        };

        debug!(model = %self.name, probability, label = %label, "ONNX inference complete");
        Ok((label, probability))
    }
}
