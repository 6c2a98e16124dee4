//! FishFlow API Service Library
//!
//! HTTP front end over the scenario data layer: movement scenarios
//! (geometries, habitat quality, movement matrices) and depth scenarios
//! (geometries, monthly occupancy, per-cell maximum depths).

pub mod config;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the router with every endpoint and middleware layer.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = state.config.cors_layer();

    Router::new()
        // Landing page
        .route("/", get(handlers::health::root_handler))
        // Movement scenarios
        .route(
            "/v1/movement/scenarios",
            get(handlers::movement::list_scenarios_handler),
        )
        .route(
            "/v1/movement/scenario/:scenario_id/geometries",
            get(handlers::movement::geometries_handler),
        )
        .route(
            "/v1/movement/scenario/:scenario_id/habitat",
            get(handlers::movement::habitat_handler),
        )
        .route(
            "/v1/movement/scenario/:scenario_id/matrices",
            get(handlers::movement::matrices_handler),
        )
        // Depth scenarios
        .route(
            "/v1/depth/scenarios",
            get(handlers::depth::list_scenarios_handler),
        )
        .route(
            "/v1/depth/scenario/:scenario_id/geometries",
            get(handlers::depth::geometries_handler),
        )
        .route(
            "/v1/depth/scenario/:scenario_id/occupancy",
            get(handlers::depth::occupancy_handler),
        )
        .route(
            "/v1/depth/scenario/:scenario_id/cell-depths",
            get(handlers::depth::cell_depths_handler),
        )
        // Health, metrics and administration
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        .route("/admin/reload", post(handlers::health::reload_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
