//! Classifier loading and inference components

pub mod classifier;
pub mod gateway;
pub mod loader;
pub mod logistic;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use classifier::Classifier;
pub use gateway::ModelGateway;
pub use loader::{ArtifactFormat, ArtifactSpec, ModelLoader};
pub use logistic::LogisticRegression;
