//! Movement scenario handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use fishflow_common::{DatasetFamily, ScenarioSummary};

use crate::state::AppState;
use super::{bad_request, not_found, required_date};

#[derive(Debug, Serialize)]
pub struct ScenariosResponse {
    pub scenarios: Vec<ScenarioSummary>,
}

/// Query parameters for the matrices endpoint.
#[derive(Debug, Deserialize)]
pub struct MatricesQueryParams {
    /// First date, `YYYY-MM-DD`.
    pub start_date: Option<String>,

    /// Last date (inclusive), `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

/// GET /v1/movement/scenarios
pub async fn list_scenarios_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<ScenariosResponse> {
    let service = state.service().await;
    Json(ScenariosResponse {
        scenarios: service.list_movement_scenarios().to_vec(),
    })
}

/// GET /v1/movement/scenario/:scenario_id/geometries
pub async fn geometries_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(scenario_id): Path<String>,
) -> Response {
    let service = state.service().await;
    match service.get_geometries(DatasetFamily::Movement, &scenario_id).await {
        Some(geometries) => Json(geometries).into_response(),
        None => not_found("Scenario not found or geometries unavailable"),
    }
}

/// GET /v1/movement/scenario/:scenario_id/habitat
pub async fn habitat_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(scenario_id): Path<String>,
) -> Response {
    let service = state.service().await;
    match service.get_habitat_quality(&scenario_id).await {
        Some(habitat) => Json(habitat).into_response(),
        None => not_found("Scenario not found or habitat data unavailable"),
    }
}

/// GET /v1/movement/scenario/:scenario_id/matrices?start_date&end_date
pub async fn matrices_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(scenario_id): Path<String>,
    Query(params): Query<MatricesQueryParams>,
) -> Response {
    let service = state.service().await;

    if service.get_movement_scenario(&scenario_id).is_none() {
        return not_found("Scenario not found");
    }

    let start = match required_date("start_date", params.start_date.as_deref()) {
        Ok(date) => date,
        Err(response) => return response,
    };
    let end = match required_date("end_date", params.end_date.as_deref()) {
        Ok(date) => date,
        Err(response) => return response,
    };

    match service.get_movement_matrices(&scenario_id, start, end).await {
        Ok(Some(matrices)) => Json(matrices).into_response(),
        Ok(None) => not_found("Movement matrices unavailable for this date range"),
        Err(e) => bad_request(e.to_string()),
    }
}
