//! Feature Vector Assembly

use crate::reading::SensorReading;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Number of features in the vector
pub const FEATURE_DIMENSION: usize = 5;

/// Feature order expected by a trained model. Changing it invalidates every
/// persisted model artifact.
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] =
    ["temperature", "vibration", "current", "pressure", "rpm"];

/// Fixed-order numeric encoding of a reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Raw feature values, ordered as `FEATURE_NAMES`
    pub values: [f64; FEATURE_DIMENSION],
}

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_DIMENSION]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Value of one named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.values[idx])
    }
}

impl From<[f64; FEATURE_DIMENSION]> for FeatureVector {
    fn from(values: [f64; FEATURE_DIMENSION]) -> Self {
        Self::new(values)
    }
}

/// Stateless extractor mapping readings to feature vectors
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract features from a single reading
    pub fn extract(&self, reading: &SensorReading) -> FeatureVector {
        let features = FeatureVector::new([
            reading.temperature,
            reading.vibration,
            reading.current,
            reading.pressure,
            reading.rpm,
        ]);
        trace!(machine_id = %reading.machine_id, values = ?features.values, "Extracted features");
        features
    }
}
