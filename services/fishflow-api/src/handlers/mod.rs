//! HTTP request handlers for the FishFlow API.

pub mod depth;
pub mod health;
pub mod movement;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;

use fishflow_common::time::parse_date;

/// Error body, `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

pub fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorDetail {
            detail: detail.into(),
        }),
    )
        .into_response()
}

pub fn not_found(detail: impl Into<String>) -> Response {
    error_response(StatusCode::NOT_FOUND, detail)
}

pub fn bad_request(detail: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, detail)
}

/// Parse a required `YYYY-MM-DD` query parameter.
pub(crate) fn required_date(name: &str, value: Option<&str>) -> Result<NaiveDate, Response> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v.trim(),
        _ => return Err(bad_request(format!("Missing required parameter: {}", name))),
    };
    parse_date(value).map_err(|e| bad_request(format!("Invalid {}: {}", name, e)))
}
