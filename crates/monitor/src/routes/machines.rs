//! Machine Routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use storage::MachineSummary;

use crate::AppState;

/// Response for the machines endpoint
#[derive(Debug, Serialize)]
pub struct MachinesResponse {
    pub data: Vec<MachineSummary>,
    pub count: usize,
}

/// Every machine seen so far, ordered by id
pub async fn get_machines(State(state): State<Arc<AppState>>) -> Json<MachinesResponse> {
    let data = state.snapshots.borrow().machines.clone();

    Json(MachinesResponse {
        count: data.len(),
        data,
    })
}
