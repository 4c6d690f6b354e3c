//! Simplebank API Server
//!
//! Main entry point for the ledger service.

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simplebank_api::{AppState, create_router};
use simplebank_db::{TransferCoordinator, connect};
use simplebank_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simplebank=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    // The coordinator owns the pool; handlers reach it through state
    let coordinator = TransferCoordinator::from_config(db, &config.transfer);
    info!(
        strategy = %config.transfer.balance_strategy,
        max_attempts = config.transfer.max_attempts,
        "Transfer coordinator configured"
    );

    let state = AppState::new(
        coordinator,
        Duration::from_millis(config.transfer.request_timeout_ms),
    );

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
