//! Statistics Route

use axum::{extract::State, Json};
use inference_engine::ModelStatus;
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Response for the stats endpoint
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_readings: u64,
    pub anomalies_detected: u64,
    /// Percentage, two decimals
    pub anomaly_rate: f64,
    pub machines_monitored: usize,
    pub model: ModelStatus,
    pub model_status: String,
    pub decode_failures: u64,
    pub publish_failures: u64,
}

/// Current monitoring statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let snapshot = state.snapshots.borrow().clone();

    Json(StatsResponse {
        total_readings: snapshot.stats.total_readings,
        anomalies_detected: snapshot.stats.anomalies_detected,
        anomaly_rate: (snapshot.anomaly_rate * 100.0).round() / 100.0,
        machines_monitored: snapshot.stats.active_machines,
        model_status: snapshot.model.to_string(),
        model: snapshot.model,
        decode_failures: snapshot.decode_failures,
        publish_failures: snapshot.publish_failures,
    })
}
