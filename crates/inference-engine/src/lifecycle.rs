//! Model Lifecycle Manager
//!
//! `Collecting -> Training -> Ready`. Ready is terminal: once a model has been
//! fitted it is never refit for the life of the process.

use crate::artifact::ModelArtifact;
use crate::engine::AnomalyScorer;
use crate::forest::ForestConfig;
use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Lifecycle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Samples collected before the model is fitted (default: 30)
    pub min_training_samples: usize,
    /// Where the trained artifact is written; `None` disables persistence
    pub artifact_path: Option<PathBuf>,
    /// Forest hyperparameters
    pub forest: ForestConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            min_training_samples: 30,
            artifact_path: Some(PathBuf::from("models/anomaly_detector.json")),
            forest: ForestConfig::default(),
        }
    }
}

/// Explicit model state
#[derive(Debug)]
pub enum ModelState {
    /// Accumulating the global training set
    Collecting { samples: Vec<FeatureVector> },
    /// Fitting in progress
    Training,
    /// Model frozen; training set kept for reproducibility
    Ready {
        scorer: AnomalyScorer,
        training_set: Vec<FeatureVector>,
    },
}

/// Outcome of feeding one feature vector to the lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Sample appended, threshold not reached yet
    Collected { collected: usize, required: usize },
    /// Threshold reached and the model is now ready
    Trained { samples: usize },
    /// Fitting failed; still collecting
    TrainingFailed { reason: String },
    /// Model already trained; nothing collected
    AlreadyReady,
}

/// Read-only summary of the lifecycle, suitable for snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    Collecting { collected: usize, required: usize },
    Training,
    Ready { training_samples: usize },
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready { .. })
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::Collecting {
                collected,
                required,
            } => write!(f, "Training ({}/{})", collected, required),
            ModelStatus::Training => write!(f, "Training"),
            ModelStatus::Ready { .. } => write!(f, "Trained"),
        }
    }
}

/// Owns the training set and, once fitted, the frozen scorer
pub struct ModelLifecycle {
    config: LifecycleConfig,
    state: ModelState,
    /// Number of successful fits (never exceeds 1)
    trained_count: u32,
}

impl ModelLifecycle {
    /// Create a new lifecycle in the collecting state
    pub fn new(config: LifecycleConfig) -> Self {
        info!(
            "Creating model lifecycle: training after {} samples",
            config.min_training_samples
        );
        Self {
            state: ModelState::Collecting {
                samples: Vec::with_capacity(config.min_training_samples),
            },
            config,
            trained_count: 0,
        }
    }

    /// Feed one feature vector
    pub fn observe(&mut self, features: FeatureVector) -> LifecycleEvent {
        let required = self.config.min_training_samples;

        let samples = match &mut self.state {
            ModelState::Ready { .. } | ModelState::Training => return LifecycleEvent::AlreadyReady,
            ModelState::Collecting { samples } => {
                samples.push(features);
                if samples.len() < required {
                    return LifecycleEvent::Collected {
                        collected: samples.len(),
                        required,
                    };
                }
                std::mem::take(samples)
            }
        };

        self.state = ModelState::Training;
        info!("Training anomaly model on {} samples", samples.len());

        match AnomalyScorer::fit(&samples, self.config.forest.clone()) {
            Ok(scorer) => {
                self.trained_count += 1;
                info!(
                    offset = scorer.forest().offset(),
                    "Model trained on {} samples (features: temperature, vibration, current, pressure, rpm)",
                    samples.len()
                );
                self.persist(&scorer, samples.len());

                let trained = samples.len();
                self.state = ModelState::Ready {
                    scorer,
                    training_set: samples,
                };
                LifecycleEvent::Trained { samples: trained }
            }
            Err(e) => {
                error!("Model training failed, continuing to collect: {}", e);
                self.state = ModelState::Collecting { samples };
                LifecycleEvent::TrainingFailed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Best-effort artifact write; failure leaves the in-memory model usable
    fn persist(&self, scorer: &AnomalyScorer, training_samples: usize) {
        let Some(path) = &self.config.artifact_path else {
            return;
        };

        match ModelArtifact::new(scorer, training_samples).write_to(path) {
            Ok(()) => info!("Model saved to {}", path.display()),
            Err(e) => warn!("Failed to persist model to {}: {}", path.display(), e),
        }
    }

    /// Scorer gate: `Some` only once the model is ready
    pub fn scorer(&self) -> Option<&AnomalyScorer> {
        match &self.state {
            ModelState::Ready { scorer, .. } => Some(scorer),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.scorer().is_some()
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn status(&self) -> ModelStatus {
        match &self.state {
            ModelState::Collecting { samples } => ModelStatus::Collecting {
                collected: samples.len(),
                required: self.config.min_training_samples,
            },
            ModelState::Training => ModelStatus::Training,
            ModelState::Ready { training_set, .. } => ModelStatus::Ready {
                training_samples: training_set.len(),
            },
        }
    }

    /// Samples collected so far, or the set the model was fitted on
    pub fn training_set(&self) -> &[FeatureVector] {
        match &self.state {
            ModelState::Collecting { samples } => samples,
            ModelState::Training => &[],
            ModelState::Ready { training_set, .. } => training_set,
        }
    }

    pub fn trained_count(&self) -> u32 {
        self.trained_count
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> FeatureVector {
        let j = |m: usize| ((i * m) % 11) as f64 / 10.0 - 0.5;
        FeatureVector::new([
            65.0 + 2.0 * j(7),
            2.0 + 0.3 * j(3),
            10.0 + 0.5 * j(5),
            6.0 + 0.2 * j(2),
            1500.0 + 50.0 * j(9),
        ])
    }

    fn config_without_artifact() -> LifecycleConfig {
        LifecycleConfig {
            artifact_path: None,
            ..Default::default()
        }
    }

    #[test]
    fn test_collects_until_threshold() {
        let mut lifecycle = ModelLifecycle::new(config_without_artifact());

        for i in 0..29 {
            let event = lifecycle.observe(sample(i));
            assert_eq!(
                event,
                LifecycleEvent::Collected {
                    collected: i + 1,
                    required: 30
                }
            );
            assert!(lifecycle.scorer().is_none());
        }

        assert_eq!(lifecycle.observe(sample(29)), LifecycleEvent::Trained { samples: 30 });
        assert!(lifecycle.is_ready());
        assert_eq!(lifecycle.status(), ModelStatus::Ready { training_samples: 30 });
    }

    #[test]
    fn test_trains_exactly_once() {
        let mut lifecycle = ModelLifecycle::new(config_without_artifact());

        for i in 0..100 {
            lifecycle.observe(sample(i));
        }

        assert_eq!(lifecycle.trained_count(), 1);
        // Post-threshold samples are not appended
        assert_eq!(lifecycle.training_set().len(), 30);
        assert_eq!(lifecycle.observe(sample(0)), LifecycleEvent::AlreadyReady);
    }

    #[test]
    fn test_failed_fit_keeps_collecting() {
        let config = LifecycleConfig {
            min_training_samples: 3,
            artifact_path: None,
            forest: ForestConfig {
                contamination: 0.9,
                ..Default::default()
            },
        };
        let mut lifecycle = ModelLifecycle::new(config);

        lifecycle.observe(sample(0));
        lifecycle.observe(sample(1));
        let event = lifecycle.observe(sample(2));

        assert!(matches!(event, LifecycleEvent::TrainingFailed { .. }));
        assert_eq!(lifecycle.trained_count(), 0);
        assert_eq!(lifecycle.training_set().len(), 3);
        assert!(!lifecycle.is_ready());
    }

    #[test]
    fn test_persists_artifact_after_training() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("anomaly_detector.json");
        let mut lifecycle = ModelLifecycle::new(LifecycleConfig {
            artifact_path: Some(path.clone()),
            ..Default::default()
        });

        for i in 0..30 {
            lifecycle.observe(sample(i));
        }

        let artifact = ModelArtifact::read_from(&path).unwrap();
        assert_eq!(artifact.training_samples, 30);
    }

    #[test]
    fn test_persistence_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is needed makes the write fail
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let mut lifecycle = ModelLifecycle::new(LifecycleConfig {
            artifact_path: Some(blocker.join("model.json")),
            ..Default::default()
        });

        for i in 0..30 {
            lifecycle.observe(sample(i));
        }

        assert!(lifecycle.is_ready());
    }

    #[test]
    fn test_status_display() {
        let status = ModelStatus::Collecting {
            collected: 12,
            required: 30,
        };
        assert_eq!(status.to_string(), "Training (12/30)");
        assert_eq!(ModelStatus::Ready { training_samples: 30 }.to_string(), "Trained");
    }
}
