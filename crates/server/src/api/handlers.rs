use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use topicwatch_core::{SanitizedConfig, ScheduleEntry};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub scheduler_running: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        scheduler_running: state.scheduler().is_running(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    pub count: usize,
    pub entries: Vec<ScheduleEntry>,
}

/// Pending checks, earliest first.
pub async fn get_schedule(State(state): State<Arc<AppState>>) -> Json<ScheduleResponse> {
    let entries = state.scheduler().pending_snapshot().await;
    Json(ScheduleResponse {
        count: entries.len(),
        entries,
    })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
