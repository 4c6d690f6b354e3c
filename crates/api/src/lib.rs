//! HTTP service facade with Axum routes.
//!
//! This crate provides:
//! - REST routes for accounts, entries and transfers
//! - Error-to-response mapping
//! - Request id propagation into the transfer coordinator

pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::DatabaseConnection;
use simplebank_db::TransferCoordinator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Transfer coordinator.
    pub coordinator: Arc<TransferCoordinator>,
    /// Deadline applied to each transfer request.
    pub transfer_timeout: Duration,
}

impl AppState {
    /// Builds state around a coordinator, sharing its connection pool.
    #[must_use]
    pub fn new(coordinator: TransferCoordinator, transfer_timeout: Duration) -> Self {
        Self {
            db: Arc::new(coordinator.connection().clone()),
            coordinator: Arc::new(coordinator),
            transfer_timeout,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
