//! Anomaly Inference Engine
//!
//! Bootstraps an Isolation Forest from the first observed readings, then
//! scores every following reading against the frozen model.

mod artifact;
mod engine;
mod forest;
mod lifecycle;

pub use artifact::{ArtifactError, ModelArtifact, ARTIFACT_SCHEMA_VERSION};
pub use engine::{AnomalyScorer, ScoreResult};
pub use forest::{average_path_length, ForestConfig, IsolationForest, IsolationTree};
pub use lifecycle::{LifecycleConfig, LifecycleEvent, ModelLifecycle, ModelState, ModelStatus};

use feature_engine::ScalerError;
use thiserror::Error;

/// Errors fitting the anomaly model
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Not enough training samples: need {required}, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },
    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),
    #[error("Scaler fit failed: {0}")]
    Scaler(#[from] ScalerError),
}
