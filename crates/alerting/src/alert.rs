//! Alert Record and Delivery Seam

use crate::severity::Severity;
use feature_engine::SensorReading;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors delivering an alert
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Alert serialization failed: {0}")]
    Serialization(String),
    #[error("Alert delivery failed: {0}")]
    Delivery(String),
}

/// Snapshot of the raw metrics that triggered an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMetrics {
    pub temperature: f64,
    pub vibration: f64,
    pub current: f64,
    pub pressure: f64,
    pub rpm: f64,
}

impl From<&SensorReading> for AlertMetrics {
    fn from(reading: &SensorReading) -> Self {
        Self {
            temperature: reading.temperature,
            vibration: reading.vibration,
            current: reading.current,
            pressure: reading.pressure,
            rpm: reading.rpm,
        }
    }
}

/// Immutable anomaly alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Process-scoped sequence id, e.g. `ALERT_0001`
    pub alert_id: String,
    pub machine_id: String,
    pub timestamp: String,
    /// Model score rounded to 4 decimals
    pub anomaly_score: f64,
    pub metrics: AlertMetrics,
    pub severity: Severity,
    pub recommendation: String,
}

/// Outbound alert channel
///
/// Implementations must not block on the network: publishing is best-effort
/// and a failure never rolls back the recorded alert.
pub trait AlertSink {
    fn publish(&self, alert: &Alert) -> Result<(), PublishError>;
}

/// Sink that drops every alert
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AlertSink for NullSink {
    fn publish(&self, _alert: &Alert) -> Result<(), PublishError> {
        Ok(())
    }
}

impl<S: AlertSink + ?Sized> AlertSink for &S {
    fn publish(&self, alert: &Alert) -> Result<(), PublishError> {
        (**self).publish(alert)
    }
}
