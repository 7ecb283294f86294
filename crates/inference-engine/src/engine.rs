//! Anomaly Scorer

use crate::forest::{ForestConfig, IsolationForest};
use crate::InferenceError;
use feature_engine::{FeatureVector, StandardScaler};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of scoring one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Whether the model labels the reading an outlier
    pub is_anomaly: bool,
    /// Continuous outlier score, more negative = more anomalous
    pub score: f64,
}

/// Frozen scaler + forest pair
///
/// Only reachable through a trained lifecycle, so scoring before training is
/// not representable.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyScorer {
    scaler: StandardScaler,
    forest: IsolationForest,
}

impl AnomalyScorer {
    /// Fit scaler and forest on raw training vectors
    pub fn fit(samples: &[FeatureVector], config: ForestConfig) -> Result<Self, InferenceError> {
        let scaler = StandardScaler::fit(samples)?;
        let scaled = scaler.transform_all(samples);
        let forest = IsolationForest::fit(&scaled, config)?;
        Ok(Self { scaler, forest })
    }

    pub(crate) fn from_parts(scaler: StandardScaler, forest: IsolationForest) -> Self {
        Self { scaler, forest }
    }

    /// Score a raw feature vector
    pub fn score(&self, features: &FeatureVector) -> ScoreResult {
        let scaled = self.scaler.transform(features);
        let score = self.forest.score_sample(&scaled);
        let is_anomaly = self.forest.predict(&scaled);

        debug!(score, is_anomaly, "Scored feature vector");

        ScoreResult { is_anomaly, score }
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn forest(&self) -> &IsolationForest {
        &self.forest
    }
}
