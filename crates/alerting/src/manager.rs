//! Alert Manager Implementation

use crate::alert::{Alert, AlertMetrics};
use crate::recommendation::{RecommendationEngine, RecommendationRules};
use crate::severity::{Severity, SeverityThresholds};
use feature_engine::SensorReading;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Alert configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Score cut-offs for severity tiers
    pub severity: SeverityThresholds,
    /// Raw metric limits for recommendations
    pub recommendation: RecommendationRules,
    /// Alerts kept in published snapshots
    pub recent_alert_limit: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            severity: SeverityThresholds::default(),
            recommendation: RecommendationRules::default(),
            recent_alert_limit: 20,
        }
    }
}

/// Allocates alert ids and assembles alert records
pub struct AlertManager {
    /// Configuration
    config: AlertConfig,
    recommender: RecommendationEngine,
    /// Alerts issued so far; the next id is `issued + 1`
    issued: u64,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert manager with config: {:?}", config);
        Self {
            recommender: RecommendationEngine::new(config.recommendation.clone()),
            config,
            issued: 0,
        }
    }

    /// Format a sequence number as an alert id
    pub fn format_id(sequence: u64) -> String {
        format!("ALERT_{:04}", sequence)
    }

    /// Get severity level for a score
    pub fn severity(&self, score: f64) -> Severity {
        self.config.severity.classify(score)
    }

    pub fn recommend(&self, reading: &SensorReading) -> String {
        self.recommender.recommend(reading)
    }

    /// Build the next alert for an anomalous reading
    pub fn raise(&mut self, reading: &SensorReading, score: f64, timestamp: String) -> Alert {
        self.issued += 1;

        Alert {
            alert_id: Self::format_id(self.issued),
            machine_id: reading.machine_id.clone(),
            timestamp,
            anomaly_score: (score * 10_000.0).round() / 10_000.0,
            metrics: AlertMetrics::from(reading),
            severity: self.severity(score),
            recommendation: self.recommend(reading),
        }
    }

    /// Alerts issued so far
    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faulty() -> SensorReading {
        SensorReading::new("MACHINE_003", 120.0, 8.0, 20.0, 6.0, 1200.0)
            .with_timestamp("2024-05-01T12:00:00")
    }

    #[test]
    fn test_ids_are_sequential_and_padded() {
        let mut manager = AlertManager::default();

        let first = manager.raise(&faulty(), -0.62, "t1".to_string());
        let second = manager.raise(&faulty(), -0.41, "t2".to_string());

        assert_eq!(first.alert_id, "ALERT_0001");
        assert_eq!(second.alert_id, "ALERT_0002");
        assert_eq!(manager.issued(), 2);
        assert_eq!(AlertManager::format_id(12_345), "ALERT_12345");
    }

    #[test]
    fn test_alert_contents() {
        let mut manager = AlertManager::default();
        let alert = manager.raise(&faulty(), -0.623_456_7, "2024-05-01T12:00:00".to_string());

        assert_eq!(alert.machine_id, "MACHINE_003");
        assert_eq!(alert.anomaly_score, -0.6235);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.metrics.temperature, 120.0);
        assert_eq!(alert.metrics.rpm, 1200.0);
        assert!(alert.recommendation.starts_with("Schedule inspection: "));
    }

    #[test]
    fn test_alert_json_shape() {
        let mut manager = AlertManager::default();
        let alert = manager.raise(&faulty(), -0.45, "2024-05-01T12:00:00".to_string());
        let json = serde_json::to_value(&alert).unwrap();

        assert_eq!(json["alert_id"], "ALERT_0001");
        assert_eq!(json["severity"], "WARNING");
        assert_eq!(json["metrics"]["vibration"], 8.0);
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00");
    }
}
