//! Persisted Model Artifact
//!
//! Versioned JSON document holding the fitted scaler and forest together
//! with the feature order they were trained on, so any consumer can check
//! compatibility before using the parameters.

use crate::engine::AnomalyScorer;
use crate::forest::IsolationForest;
use chrono::{DateTime, Utc};
use feature_engine::{StandardScaler, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Current artifact schema version
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Errors writing or reading a model artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Artifact serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unsupported artifact schema version {found} (expected {expected})")]
    SchemaVersion { expected: u32, found: u32 },
    #[error("Feature order mismatch: expected {expected:?}, found {found:?}")]
    FeatureOrder {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Serialized (scaler, model) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    pub feature_order: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    pub scaler: StandardScaler,
    pub forest: IsolationForest,
}

impl ModelArtifact {
    /// Capture a trained scorer
    pub fn new(scorer: &AnomalyScorer, training_samples: usize) -> Self {
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            feature_order: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            trained_at: Utc::now(),
            training_samples,
            scaler: scorer.scaler().clone(),
            forest: scorer.forest().clone(),
        }
    }

    /// Write the artifact as JSON, creating parent directories.
    ///
    /// The document is staged in a temporary file next to `path` and renamed
    /// over it, so an interrupted write never leaves a truncated artifact.
    pub fn write_to(&self, path: &Path) -> Result<(), ArtifactError> {
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let bytes = serde_json::to_vec_pretty(self)?;

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(&bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| e.error)?;

        debug!(path = %path.display(), "Wrote model artifact");
        Ok(())
    }

    /// Read an artifact and check it matches this build's schema and features
    pub fn read_from(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path)?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check schema version and feature order
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(ArtifactError::SchemaVersion {
                expected: ARTIFACT_SCHEMA_VERSION,
                found: self.schema_version,
            });
        }
        if !self.feature_order.iter().map(String::as_str).eq(FEATURE_NAMES) {
            return Err(ArtifactError::FeatureOrder {
                expected: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                found: self.feature_order.clone(),
            });
        }
        Ok(())
    }

    /// Rebuild the scorer from a validated artifact
    pub fn into_scorer(self) -> AnomalyScorer {
        AnomalyScorer::from_parts(self.scaler, self.forest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestConfig;
    use feature_engine::FeatureVector;

    fn scorer() -> AnomalyScorer {
        let samples: Vec<FeatureVector> = (0..20)
            .map(|i| FeatureVector::new([60.0 + i as f64, 2.0, 10.0 + (i % 3) as f64, 6.0, 1500.0]))
            .collect();
        AnomalyScorer::fit(&samples, ForestConfig::default()).unwrap()
    }

    #[test]
    fn test_written_artifact_reloads_same_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("anomaly_detector.json");

        let scorer = scorer();
        ModelArtifact::new(&scorer, 20).write_to(&path).unwrap();

        let loaded = ModelArtifact::read_from(&path).unwrap();
        assert_eq!(loaded.training_samples, 20);
        assert_eq!(loaded.feature_order, FEATURE_NAMES.to_vec());

        let probe = FeatureVector::new([95.0, 5.0, 14.0, 6.0, 1300.0]);
        assert_eq!(loaded.into_scorer().score(&probe), scorer.score(&probe));
    }

    #[test]
    fn test_artifact_carries_schema_and_feature_order() {
        let json = serde_json::to_value(ModelArtifact::new(&scorer(), 20)).unwrap();
        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["feature_order"][0], "temperature");
        assert_eq!(json["feature_order"][4], "rpm");
    }

    #[test]
    fn test_incompatible_artifacts_rejected() {
        let mut artifact = ModelArtifact::new(&scorer(), 20);
        artifact.schema_version = 7;
        assert!(matches!(
            artifact.validate(),
            Err(ArtifactError::SchemaVersion { expected: 1, found: 7 })
        ));

        let mut artifact = ModelArtifact::new(&scorer(), 20);
        artifact.feature_order.swap(0, 1);
        assert!(matches!(artifact.validate(), Err(ArtifactError::FeatureOrder { .. })));
    }

    #[test]
    fn test_rewrite_replaces_existing_file_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anomaly_detector.json");
        std::fs::write(&path, b"{\"schema_version\": 1, \"trunc").unwrap();
        assert!(matches!(
            ModelArtifact::read_from(&path),
            Err(ArtifactError::Serialization(_))
        ));

        let scorer = scorer();
        ModelArtifact::new(&scorer, 20).write_to(&path).unwrap();
        ModelArtifact::new(&scorer, 21).write_to(&path).unwrap();

        assert_eq!(ModelArtifact::read_from(&path).unwrap().training_samples, 21);
        // No staging files are left beside the artifact
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::read_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io(_)));
    }
}
