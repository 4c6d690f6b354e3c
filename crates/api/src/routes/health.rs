//! Health check endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Whether the store answered a ping.
    pub database: &'static str,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "up"),
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: if status.is_success() { "healthy" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
