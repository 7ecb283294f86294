//! Health Route

use axum::{extract::State, Json};
use inference_engine::ModelStatus;
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelStatus,
    /// Seconds since the last snapshot was published
    pub last_update_seconds: i64,
}

/// Liveness plus model state
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.snapshots.borrow().clone();
    let now = chrono::Utc::now();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: now.timestamp(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: snapshot.model,
        last_update_seconds: (now - snapshot.updated_at).num_seconds().max(0),
    })
}
