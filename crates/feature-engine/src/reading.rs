//! Sensor Reading Decoding

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors decoding an inbound reading message
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid UTF-8
    #[error("Payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Payload is not a valid reading document
    #[error("Invalid reading JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// One timestamped set of measurements from one machine
///
/// Numeric fields absent from the message decode as 0.0. Fields the monitor
/// does not use are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub machine_id: String,
    /// Producer timestamp (ISO-8601), passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Temperature (°C)
    #[serde(default)]
    pub temperature: f64,
    /// Vibration (mm/s)
    #[serde(default)]
    pub vibration: f64,
    /// Current draw (A)
    #[serde(default)]
    pub current: f64,
    /// Pressure (bar)
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub rpm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_hours: Option<f64>,
    /// Simulated degradation percentage reported by the producer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degradation_level: Option<f64>,
}

impl SensorReading {
    /// Create a reading with the five monitored metrics
    pub fn new(
        machine_id: impl Into<String>,
        temperature: f64,
        vibration: f64,
        current: f64,
        pressure: f64,
        rpm: f64,
    ) -> Self {
        Self {
            machine_id: machine_id.into(),
            timestamp: None,
            temperature,
            vibration,
            current,
            pressure,
            rpm,
            runtime_hours: None,
            degradation_level: None,
        }
    }

    /// Attach a producer timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Decode a reading from a raw message payload
    pub fn from_json(payload: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(payload)?;
        let reading: SensorReading = serde_json::from_str(text)?;
        if reading.machine_id.trim().is_empty() {
            return Err(DecodeError::MissingField("machine_id"));
        }
        Ok(reading)
    }
}
