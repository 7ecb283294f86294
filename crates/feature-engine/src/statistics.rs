//! Statistical Features Computation

use crate::features::{FeatureVector, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors fitting a scaler
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalerError {
    #[error("Cannot fit scaler on an empty training set")]
    EmptyTrainingSet,
    #[error("Non-finite value in feature column {column}")]
    NonFinite { column: usize },
}

/// Summary statistics for a single signal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStats {
    /// Mean value
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl ColumnStats {
    /// Compute statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let m2: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        let std_dev = (m2 / n).sqrt();

        Self {
            mean,
            std_dev,
            min,
            max,
        }
    }
}

/// Per-dimension standardization, fitted once and frozen
///
/// A constant dimension gets a scale of 1.0 so it maps to zero instead of
/// dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; FEATURE_DIMENSION],
    pub scale: [f64; FEATURE_DIMENSION],
}

impl StandardScaler {
    /// Fit mean and standard deviation over a training set
    pub fn fit(samples: &[FeatureVector]) -> Result<Self, ScalerError> {
        if samples.is_empty() {
            return Err(ScalerError::EmptyTrainingSet);
        }

        let mut mean = [0.0; FEATURE_DIMENSION];
        let mut scale = [1.0; FEATURE_DIMENSION];

        for column in 0..FEATURE_DIMENSION {
            let values: Vec<f64> = samples.iter().map(|s| s.values[column]).collect();
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ScalerError::NonFinite { column });
            }

            let stats = ColumnStats::compute(&values);
            mean[column] = stats.mean;
            if stats.std_dev > f64::EPSILON {
                scale[column] = stats.std_dev;
            }
        }

        debug!(?mean, ?scale, samples = samples.len(), "Fitted standard scaler");
        Ok(Self { mean, scale })
    }

    /// Center and scale one feature vector
    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut values = [0.0; FEATURE_DIMENSION];
        for (i, value) in values.iter_mut().enumerate() {
            *value = (features.values[i] - self.mean[i]) / self.scale[i];
        }
        FeatureVector::new(values)
    }

    pub fn transform_all(&self, samples: &[FeatureVector]) -> Vec<FeatureVector> {
        samples.iter().map(|s| self.transform(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = ColumnStats::compute(&values);
        assert!((stats.mean - 3.0).abs() < 0.001);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_std_dev_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = ColumnStats::compute(&values);
        // Population std dev is exactly 2.0 for this dataset
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_values() {
        let stats = ColumnStats::compute(&[]);
        assert_eq!(stats.mean, 0.0);
    }

    #[test]
    fn test_scaler_standardizes_columns() {
        let samples = vec![
            FeatureVector::new([60.0, 1.0, 10.0, 6.0, 1400.0]),
            FeatureVector::new([70.0, 3.0, 10.0, 6.0, 1600.0]),
        ];
        let scaler = StandardScaler::fit(&samples).unwrap();

        assert_eq!(scaler.mean, [65.0, 2.0, 10.0, 6.0, 1500.0]);
        // Constant columns keep a unit scale
        assert_eq!(scaler.scale[2], 1.0);
        assert_eq!(scaler.scale[3], 1.0);

        let scaled = scaler.transform(&samples[1]);
        assert!((scaled.values[0] - 1.0).abs() < 1e-9);
        assert!((scaled.values[4] - 1.0).abs() < 1e-9);
        assert_eq!(scaled.values[2], 0.0);
    }

    #[test]
    fn test_scaler_rejects_empty_and_non_finite() {
        assert_eq!(StandardScaler::fit(&[]), Err(ScalerError::EmptyTrainingSet));

        let samples = vec![FeatureVector::new([f64::NAN, 0.0, 0.0, 0.0, 0.0])];
        assert_eq!(
            StandardScaler::fit(&samples),
            Err(ScalerError::NonFinite { column: 0 })
        );
    }
}
