//! Landing, health, metrics and administration handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::SERVICE_VERSION;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub storage: String,
    pub movement_scenarios: usize,
    pub depth_scenarios: usize,
}

/// GET / - Service banner
pub async fn root_handler(Extension(state): Extension<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{} is running", state.config.title),
        version: SERVICE_VERSION.to_string(),
    })
}

/// GET /health - Basic health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /ready - Ready once at least one scenario is loaded
pub async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let service = state.service().await;
    let response = ready_status(&service);

    let status = if response.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response)).into_response()
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

/// POST /admin/reload - Re-scan storage for scenarios
pub async fn reload_handler(Extension(state): Extension<Arc<AppState>>) -> Json<ReadyResponse> {
    let service = state.reload().await;
    Json(ready_status(&service))
}

fn ready_status(service: &scenario_data::ScenarioDataService) -> ReadyResponse {
    let movement_scenarios = service.list_movement_scenarios().len();
    let depth_scenarios = service.list_depth_scenarios().len();

    ReadyResponse {
        ready: movement_scenarios + depth_scenarios > 0,
        storage: service.backend().describe(),
        movement_scenarios,
        depth_scenarios,
    }
}
