//! Monitor configuration
//!
//! Layered with the `config` crate: built-in defaults, an optional TOML file,
//! then `MONITOR__SECTION__KEY` environment variables.

use alerting::AlertConfig;
use inference_engine::LifecycleConfig;
use mqtt_bridge::MqttConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default configuration file, read only if present
pub const DEFAULT_CONFIG_FILE: &str = "monitor.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Per-machine window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Readings kept per machine (default: 50)
    pub history_capacity: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
        }
    }
}

/// Periodic statistics summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub stats_interval_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            stats_interval_secs: 30,
        }
    }
}

/// Read-only status API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Complete monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mqtt: MqttConfig,
    pub model: LifecycleConfig,
    pub window: WindowConfig,
    pub alerting: AlertConfig,
    pub report: ReportConfig,
    pub api: ApiConfig,
    /// Prometheus exporter listen address; disabled when unset
    pub metrics_addr: Option<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load defaults, then the config file (if it exists), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("MONITOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.window.history_capacity == 0 {
            return Err(SettingsError::Invalid(
                "window.history_capacity must be greater than zero".to_string(),
            ));
        }
        if self.model.min_training_samples < 2 {
            return Err(SettingsError::Invalid(
                "model.min_training_samples must be at least 2".to_string(),
            ));
        }
        self.model
            .forest
            .validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        if self.mqtt.queue_capacity == 0 {
            return Err(SettingsError::Invalid(
                "mqtt.queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.report.stats_interval_secs == 0 {
            return Err(SettingsError::Invalid(
                "report.stats_interval_secs must be greater than zero".to_string(),
            ));
        }
        let severity = &self.alerting.severity;
        if severity.critical_below > severity.warning_below {
            return Err(SettingsError::Invalid(format!(
                "alerting.severity.critical_below ({}) must not exceed warning_below ({})",
                severity.critical_below, severity.warning_below
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let config = AppConfig::default();
        assert_eq!(config.model.min_training_samples, 30);
        assert_eq!(config.model.forest.contamination, 0.15);
        assert_eq!(config.window.history_capacity, 50);
        assert_eq!(config.report.stats_interval_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.mqtt.broker_port, 1883);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
log_format = "json"

[mqtt]
broker_host = "localhost"

[model]
min_training_samples = 50

[model.forest]
n_estimators = 64

[alerting.recommendation]
max_temperature = 75.0
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.mqtt.broker_host, "localhost");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.model.min_training_samples, 50);
        assert_eq!(config.model.forest.n_estimators, 64);
        assert_eq!(config.model.forest.contamination, 0.15);
        assert_eq!(config.alerting.recommendation.max_temperature, 75.0);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.window.history_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.model.min_training_samples = 1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.model.forest.contamination = 0.7;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.alerting.severity.critical_below = -0.1;
        assert!(config.validate().is_err());
    }
}
