//! API route definitions.

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use simplebank_shared::AppError;
use tracing::error;

use crate::AppState;

pub mod accounts;
pub mod entries;
pub mod health;
pub mod transfers;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(entries::routes())
        .merge(transfers::routes())
}

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of the current request, if present.
pub(crate) fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Maps any failure to its JSON response through [`AppError`].
///
/// Server-side details stay in the logs.
pub(crate) fn error_response(err: impl Into<AppError>) -> Response {
    let err = err.into();
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if err.is_client_error() {
        err.to_string()
    } else {
        error!(error = %err, code = err.error_code(), "Request failed");
        "An error occurred".to_string()
    };
    (
        status,
        Json(json!({ "error": err.error_code(), "message": message })),
    )
        .into_response()
}
