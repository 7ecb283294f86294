//! Per-Machine Window Store

use crate::StorageError;
use alerting::{Alert, Severity};
use feature_engine::SensorReading;
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Process-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStats {
    pub total_readings: u64,
    pub anomalies_detected: u64,
    pub active_machines: usize,
}

impl MonitorStats {
    /// Anomalies as a percentage of readings
    pub fn anomaly_rate(&self) -> f64 {
        self.anomalies_detected as f64 / self.total_readings.max(1) as f64 * 100.0
    }
}

/// History and alerts for one machine
#[derive(Debug, Clone)]
pub struct MachineState {
    /// Most recent readings, oldest first
    pub readings: RingBuffer<SensorReading>,
    pub alerts: Vec<Alert>,
}

impl MachineState {
    /// Timestamp of the latest reading
    pub fn last_seen(&self) -> Option<&str> {
        self.readings.latest().and_then(|r| r.timestamp.as_deref())
    }

    pub fn summary(&self, machine_id: &str) -> MachineSummary {
        MachineSummary {
            machine_id: machine_id.to_string(),
            readings_held: self.readings.len(),
            readings_total: self.readings.total_written(),
            alert_count: self.alerts.len(),
            last_seen: self.last_seen().map(str::to_string),
            latest: self.readings.latest().cloned(),
        }
    }
}

/// Read-only view of one machine for snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSummary {
    pub machine_id: String,
    pub readings_held: usize,
    pub readings_total: u64,
    pub alert_count: usize,
    pub last_seen: Option<String>,
    pub latest: Option<SensorReading>,
}

/// Owns every machine's bounded history, the alert history and the counters
pub struct WindowStore {
    machines: BTreeMap<String, MachineState>,
    alert_history: Vec<Alert>,
    stats: MonitorStats,
    /// Empty window cloned for each new machine
    empty_window: RingBuffer<SensorReading>,
}

impl WindowStore {
    /// Create a store keeping `history_capacity` readings per machine
    pub fn new(history_capacity: usize) -> Result<Self, StorageError> {
        info!("Creating window store: {} readings per machine", history_capacity);
        Ok(Self {
            machines: BTreeMap::new(),
            alert_history: Vec::new(),
            stats: MonitorStats::default(),
            empty_window: RingBuffer::new(history_capacity)?,
        })
    }

    /// Append a reading to its machine's window. Returns true on first sighting.
    pub fn record(&mut self, reading: SensorReading) -> bool {
        self.stats.total_readings += 1;

        let mut is_new = false;
        let state = self
            .machines
            .entry(reading.machine_id.clone())
            .or_insert_with(|| {
                is_new = true;
                MachineState {
                    readings: self.empty_window.clone(),
                    alerts: Vec::new(),
                }
            });

        if let Some(evicted) = state.readings.push(reading) {
            debug!(machine_id = %evicted.machine_id, "Evicted oldest reading");
        }

        if is_new {
            self.stats.active_machines = self.machines.len();
            info!("New machine detected ({} active)", self.stats.active_machines);
        }
        is_new
    }

    /// Store an alert on its machine and in the global history
    pub fn record_alert(&mut self, alert: Alert) {
        self.stats.anomalies_detected += 1;

        let state = self
            .machines
            .entry(alert.machine_id.clone())
            .or_insert_with(|| MachineState {
                readings: self.empty_window.clone(),
                alerts: Vec::new(),
            });
        state.alerts.push(alert.clone());
        self.stats.active_machines = self.machines.len();

        self.alert_history.push(alert);
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn machine(&self, machine_id: &str) -> Option<&MachineState> {
        self.machines.get(machine_id)
    }

    /// Summaries ordered by machine id
    pub fn machines(&self) -> Vec<MachineSummary> {
        self.machines
            .iter()
            .map(|(id, state)| state.summary(id))
            .collect()
    }

    pub fn alert_history(&self) -> &[Alert] {
        &self.alert_history
    }

    /// Most recent alerts first, optionally filtered by severity
    pub fn recent_alerts(&self, limit: usize, severity: Option<Severity>) -> Vec<Alert> {
        self.alert_history
            .iter()
            .rev()
            .filter(|a| severity.map_or(true, |s| a.severity == s))
            .take(limit)
            .cloned()
            .collect()
    }
}
