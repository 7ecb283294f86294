//! Alert Routes

use alerting::{Alert, Severity};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

/// Query parameters for alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Filter by severity (CRITICAL, WARNING, INFO)
    pub severity: Option<String>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<Alert>,
    pub count: usize,
    pub critical_count: usize,
}

/// Most recent alerts first
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<AlertResponse>, (StatusCode, String)> {
    let severity = match params.severity.as_deref() {
        Some(value) => Some(Severity::parse(value).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("Unknown severity: {}", value),
            )
        })?),
        None => None,
    };

    let data: Vec<Alert> = state
        .snapshots
        .borrow()
        .recent_alerts
        .iter()
        .filter(|a| severity.map_or(true, |s| a.severity == s))
        .take(params.limit)
        .cloned()
        .collect();

    let critical_count = data
        .iter()
        .filter(|a| a.severity == Severity::Critical)
        .count();

    Ok(Json(AlertResponse {
        count: data.len(),
        critical_count,
        data,
    }))
}
