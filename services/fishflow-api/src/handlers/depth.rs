//! Depth scenario handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use fishflow_common::time::parse_date;
use fishflow_common::{DatasetFamily, OccupancyLayout};

use crate::state::AppState;
use super::movement::ScenariosResponse;
use super::{bad_request, not_found};

/// Query parameters for the occupancy endpoint.
#[derive(Debug, Deserialize)]
pub struct OccupancyQueryParams {
    /// Month as `YYYY-MM`, or any date inside it.
    pub month: Option<String>,

    /// Depth bin to select.
    pub depth_bin: Option<String>,

    /// `matrix` (timestamp-major, default) or `cells` (cell-major).
    pub layout: Option<String>,
}

/// GET /v1/depth/scenarios
pub async fn list_scenarios_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<ScenariosResponse> {
    let service = state.service().await;
    Json(ScenariosResponse {
        scenarios: service.list_depth_scenarios().to_vec(),
    })
}

/// GET /v1/depth/scenario/:scenario_id/geometries
pub async fn geometries_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(scenario_id): Path<String>,
) -> Response {
    let service = state.service().await;
    match service.get_geometries(DatasetFamily::Depth, &scenario_id).await {
        Some(geometries) => Json(geometries).into_response(),
        None => not_found("Scenario not found or geometries unavailable"),
    }
}

/// GET /v1/depth/scenario/:scenario_id/occupancy?month&depth_bin[&layout]
pub async fn occupancy_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(scenario_id): Path<String>,
    Query(params): Query<OccupancyQueryParams>,
) -> Response {
    let month = match params.month.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => match parse_month(m) {
            Some(month) => month,
            None => return bad_request(format!("Invalid month: {} (expected YYYY-MM)", m)),
        },
        _ => return bad_request("Missing required parameter: month"),
    };

    let depth_bin = match params.depth_bin.as_deref().map(str::trim) {
        Some(b) if !b.is_empty() => match b.parse::<i64>() {
            Ok(bin) => bin,
            Err(_) => return bad_request(format!("Invalid depth_bin: {}", b)),
        },
        _ => return bad_request("Missing required parameter: depth_bin"),
    };

    let layout = match params.layout.as_deref() {
        None | Some("matrix") => OccupancyLayout::TimestampMajor,
        Some("cells") => OccupancyLayout::CellMajor,
        Some(other) => {
            return bad_request(format!(
                "Invalid layout: {} (expected 'matrix' or 'cells')",
                other
            ))
        }
    };

    let service = state.service().await;
    match service.get_occupancy(&scenario_id, month, depth_bin, layout).await {
        Some(occupancy) => Json(occupancy).into_response(),
        None => {
            not_found("Scenario not found or occupancy unavailable for this month and depth bin")
        }
    }
}

/// GET /v1/depth/scenario/:scenario_id/cell-depths
pub async fn cell_depths_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(scenario_id): Path<String>,
) -> Response {
    let service = state.service().await;
    match service.get_cell_max_depths(&scenario_id).await {
        Some(depths) => Json(depths).into_response(),
        None => not_found("Scenario not found or cell depths unavailable"),
    }
}

fn parse_month(value: &str) -> Option<NaiveDate> {
    if value.len() == 7 {
        parse_date(&format!("{}-01", value)).ok()
    } else {
        parse_date(value).ok()
    }
}
