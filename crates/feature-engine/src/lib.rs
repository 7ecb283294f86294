//! Feature Engineering Engine
//!
//! Decodes raw sensor readings and maps them onto the fixed-order feature
//! vector consumed by the anomaly model, plus the standardization applied
//! before scoring.

mod features;
mod reading;
mod statistics;

pub use features::{FeatureExtractor, FeatureVector, FEATURE_DIMENSION, FEATURE_NAMES};
pub use reading::{DecodeError, SensorReading};
pub use statistics::{ColumnStats, ScalerError, StandardScaler};
