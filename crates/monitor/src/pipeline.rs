//! Per-reading pipeline
//!
//! reading -> features -> window store -> train or score -> severity ->
//! alert. One `Monitor` owns all mutable state and handles one reading at a
//! time, so the one-shot training transition needs no locking.

use crate::settings::AppConfig;
use crate::snapshot::MonitorSnapshot;
use alerting::{Alert, AlertManager, AlertSink};
use chrono::Utc;
use feature_engine::{FeatureExtractor, SensorReading};
use inference_engine::{LifecycleEvent, ModelLifecycle};
use metrics::{counter, gauge};
use mqtt_bridge::InboundMessage;
use std::future::Future;
use storage::{MonitorStats, StorageError, WindowStore};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// What happened to one reading
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingOutcome {
    /// Added to the training set; not scored
    Collecting { collected: usize, required: usize },
    /// Scored as normal operation
    Normal { score: f64 },
    /// Scored as anomalous; `delivered` is false when publishing failed
    Alerted { alert: Alert, delivered: bool },
}

/// Owned monitor context
pub struct Monitor<S> {
    extractor: FeatureExtractor,
    store: WindowStore,
    lifecycle: ModelLifecycle,
    alerts: AlertManager,
    sink: S,
    recent_alert_limit: usize,
    decode_failures: u64,
    publish_failures: u64,
}

impl<S: AlertSink> Monitor<S> {
    /// Create a monitor publishing alerts to `sink`
    pub fn new(config: &AppConfig, sink: S) -> Result<Self, StorageError> {
        Ok(Self {
            extractor: FeatureExtractor::new(),
            store: WindowStore::new(config.window.history_capacity)?,
            lifecycle: ModelLifecycle::new(config.model.clone()),
            alerts: AlertManager::new(config.alerting.clone()),
            sink,
            recent_alert_limit: config.alerting.recent_alert_limit,
            decode_failures: 0,
            publish_failures: 0,
        })
    }

    /// Decode and process one raw message. Malformed messages are logged and
    /// dropped.
    pub fn handle_payload(&mut self, topic: &str, payload: &[u8]) -> Option<ReadingOutcome> {
        match SensorReading::from_json(payload) {
            Ok(reading) => Some(self.process_reading(reading)),
            Err(e) => {
                self.decode_failures += 1;
                counter!("monitor_decode_failures_total").increment(1);
                error!(topic, "Error processing message: {}", e);
                None
            }
        }
    }

    /// Run one reading through the pipeline
    pub fn process_reading(&mut self, mut reading: SensorReading) -> ReadingOutcome {
        reading
            .timestamp
            .get_or_insert_with(|| Utc::now().to_rfc3339());

        let features = self.extractor.extract(&reading);

        if self.store.record(reading.clone()) {
            gauge!("monitor_active_machines").set(self.store.stats().active_machines as f64);
        }
        counter!("monitor_readings_total").increment(1);

        // The reading that completes the training set is scored by the
        // freshly trained model
        if !self.lifecycle.is_ready() {
            match self.lifecycle.observe(features) {
                LifecycleEvent::Collected {
                    collected,
                    required,
                } => {
                    debug!("Collected training sample {}/{}", collected, required);
                    return ReadingOutcome::Collecting {
                        collected,
                        required,
                    };
                }
                LifecycleEvent::TrainingFailed { .. } => {
                    return ReadingOutcome::Collecting {
                        collected: self.lifecycle.training_set().len(),
                        required: self.lifecycle.config().min_training_samples,
                    };
                }
                LifecycleEvent::Trained { samples } => {
                    info!("Model ready after {} samples, scoring from this reading on", samples);
                }
                LifecycleEvent::AlreadyReady => {}
            }
        }

        let Some(scorer) = self.lifecycle.scorer() else {
            return ReadingOutcome::Collecting {
                collected: self.lifecycle.training_set().len(),
                required: self.lifecycle.config().min_training_samples,
            };
        };
        let result = scorer.score(&features);

        if !result.is_anomaly {
            info!(
                "{}: Normal operation | T={:.1}°C, V={:.2}mm/s, I={:.1}A",
                reading.machine_id, reading.temperature, reading.vibration, reading.current
            );
            return ReadingOutcome::Normal {
                score: result.score,
            };
        }

        let timestamp = reading.timestamp.clone().unwrap_or_default();
        let alert = self.alerts.raise(&reading, result.score, timestamp);
        self.store.record_alert(alert.clone());
        counter!("monitor_anomalies_total").increment(1);

        warn!(
            alert_id = %alert.alert_id,
            machine_id = %alert.machine_id,
            severity = %alert.severity,
            score = alert.anomaly_score,
            "ANOMALY DETECTED: {}",
            alert.recommendation
        );

        let delivered = match self.sink.publish(&alert) {
            Ok(()) => true,
            Err(e) => {
                self.publish_failures += 1;
                counter!("monitor_publish_failures_total").increment(1);
                warn!(alert_id = %alert.alert_id, "Alert publish failed: {}", e);
                false
            }
        };

        ReadingOutcome::Alerted { alert, delivered }
    }

    pub fn stats(&self) -> MonitorStats {
        self.store.stats()
    }

    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    pub fn lifecycle(&self) -> &ModelLifecycle {
        &self.lifecycle
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }

    pub fn publish_failures(&self) -> u64 {
        self.publish_failures
    }

    /// Copy of the current state for readers outside the pipeline
    pub fn snapshot(&self) -> MonitorSnapshot {
        let stats = self.store.stats();
        MonitorSnapshot {
            stats,
            anomaly_rate: stats.anomaly_rate(),
            model: self.lifecycle.status(),
            decode_failures: self.decode_failures,
            publish_failures: self.publish_failures,
            machines: self.store.machines(),
            recent_alerts: self.store.recent_alerts(self.recent_alert_limit, None),
            updated_at: Utc::now(),
        }
    }
}

/// Consume the inbound queue until shutdown or until the queue closes,
/// publishing a snapshot after every message.
pub async fn run_monitor<S, F>(
    monitor: &mut Monitor<S>,
    mut inbound: mpsc::Receiver<InboundMessage>,
    snapshots: &watch::Sender<MonitorSnapshot>,
    shutdown: F,
) where
    S: AlertSink,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Monitor stopped by user");
                break;
            }
            message = inbound.recv() => match message {
                Some(message) => {
                    monitor.handle_payload(&message.topic, &message.payload);
                    snapshots.send_replace(monitor.snapshot());
                }
                None => {
                    warn!("Inbound queue closed, stopping monitor");
                    break;
                }
            }
        }
    }
}
