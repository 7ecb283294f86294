//! Published monitor snapshots
//!
//! The pipeline is the only writer of monitor state; everything else (the
//! periodic report, the status API) reads these copies.

use alerting::Alert;
use chrono::{DateTime, Utc};
use inference_engine::ModelStatus;
use serde::Serialize;
use storage::{MachineSummary, MonitorStats};

#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub stats: MonitorStats,
    /// Anomalies as a percentage of readings
    pub anomaly_rate: f64,
    pub model: ModelStatus,
    pub decode_failures: u64,
    pub publish_failures: u64,
    pub machines: Vec<MachineSummary>,
    /// Most recent alerts first
    pub recent_alerts: Vec<Alert>,
    pub updated_at: DateTime<Utc>,
}

impl MonitorSnapshot {
    /// Human-readable statistics summary, one line per entry
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            "MONITORING STATISTICS".to_string(),
            format!("Total Readings: {}", self.stats.total_readings),
            format!("Anomalies Detected: {}", self.stats.anomalies_detected),
            format!("Anomaly Rate: {:.2}%", self.anomaly_rate),
            format!("Machines Monitored: {}", self.stats.active_machines),
            format!("Model Status: {}", self.model),
        ]
    }
}
