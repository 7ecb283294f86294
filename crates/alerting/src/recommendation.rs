//! Rule-Based Maintenance Recommendations
//!
//! Explainable second signal next to the model score: fixed thresholds on the
//! raw metrics, independent of the anomaly score.

use feature_engine::SensorReading;
use serde::{Deserialize, Serialize};

/// Raw metric limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationRules {
    /// Maximum safe temperature (°C)
    pub max_temperature: f64,
    /// Maximum vibration (mm/s)
    pub max_vibration: f64,
    /// Maximum current draw (A)
    pub max_current: f64,
    /// Minimum optimal RPM
    pub min_rpm: f64,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        Self {
            max_temperature: 80.0,
            max_vibration: 4.0,
            max_current: 15.0,
            min_rpm: 1400.0,
        }
    }
}

/// Builds recommendation text from threshold violations
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    rules: RecommendationRules,
}

impl RecommendationEngine {
    pub fn new(rules: RecommendationRules) -> Self {
        Self { rules }
    }

    /// Names of the violated thresholds, in a fixed order
    pub fn issues(&self, reading: &SensorReading) -> Vec<&'static str> {
        let mut issues = Vec::new();

        if reading.temperature > self.rules.max_temperature {
            issues.push("Temperature exceeds safe threshold");
        }
        if reading.vibration > self.rules.max_vibration {
            issues.push("Excessive vibration detected");
        }
        if reading.current > self.rules.max_current {
            issues.push("High current draw");
        }
        if reading.rpm < self.rules.min_rpm {
            issues.push("RPM below optimal range");
        }

        issues
    }

    /// Generate the maintenance recommendation for a reading
    pub fn recommend(&self, reading: &SensorReading) -> String {
        let issues = self.issues(reading);
        if issues.is_empty() {
            "Monitor closely for additional anomalies".to_string()
        } else {
            format!("Schedule inspection: {}", issues.join("; "))
        }
    }

    pub fn rules(&self) -> &RecommendationRules {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_only() {
        let engine = RecommendationEngine::default();
        let reading = SensorReading::new("M1", 95.0, 1.0, 5.0, 6.0, 1500.0);

        let text = engine.recommend(&reading);
        assert!(text.contains("Temperature exceeds safe threshold"));
        assert!(!text.contains("vibration"));
        assert!(!text.contains("current"));
        assert!(!text.contains("RPM"));
    }

    #[test]
    fn test_all_violations_joined_in_order() {
        let engine = RecommendationEngine::default();
        let reading = SensorReading::new("M1", 120.0, 8.0, 20.0, 6.0, 1200.0);

        assert_eq!(
            engine.recommend(&reading),
            "Schedule inspection: Temperature exceeds safe threshold; \
             Excessive vibration detected; High current draw; RPM below optimal range"
        );
    }

    #[test]
    fn test_no_violation() {
        let engine = RecommendationEngine::default();
        let reading = SensorReading::new("M1", 80.0, 4.0, 15.0, 6.0, 1400.0);

        assert!(engine.issues(&reading).is_empty());
        assert_eq!(
            engine.recommend(&reading),
            "Monitor closely for additional anomalies"
        );
    }

    #[test]
    fn test_custom_rules() {
        let engine = RecommendationEngine::new(RecommendationRules {
            max_temperature: 60.0,
            ..Default::default()
        });
        let reading = SensorReading::new("M1", 65.0, 2.0, 10.0, 6.0, 1500.0);
        assert_eq!(engine.issues(&reading), vec!["Temperature exceeds safe threshold"]);
    }
}
