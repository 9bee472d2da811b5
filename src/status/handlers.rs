use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::observability::metrics::{memory_usage, MemoryUsage};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub ok: bool,
    pub proxy_path: String,
    pub target: String,
    /// Seconds since the server started.
    pub uptime: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub uptime: f64,
    pub request_count: u64,
    pub error_count: u64,
    pub memory_usage: Option<MemoryUsage>,
    pub proxy_path: String,
    pub target: String,
}

/// Liveness only; never touches the upstream.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        ok: true,
        proxy_path: state.pipeline.prefix().to_string(),
        target: state.pipeline.target().to_string(),
        uptime: state.stats.uptime_secs(),
    })
}

pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSummary> {
    let snapshot = state.stats.snapshot();
    Json(MetricsSummary {
        uptime: snapshot.uptime_secs,
        request_count: snapshot.request_count,
        error_count: snapshot.error_count,
        memory_usage: memory_usage(),
        proxy_path: state.pipeline.prefix().to_string(),
        target: state.pipeline.target().to_string(),
    })
}
