//! Database migration runner for Simplebank.
//!
//! Connects with the same configuration as the server
//! (`SIMPLEBANK__DATABASE__URL`, `.env`, `config/*`).
//!
//! Usage:
//!   migrator [up]    - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!   migrator reset   - Rollback every migration

use anyhow::{Context, bail};
use sea_orm_migration::MigratorTrait;
use simplebank_db::{connect, migration::Migrator};
use simplebank_shared::AppConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sea_orm_migration=info".into()),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = connect(&config.database).await?;

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        "reset" => Migrator::reset(&db).await?,
        other => bail!("Unknown command '{other}', expected one of: up, down, status, fresh, reset"),
    }

    info!(command = %command, "Migration command finished");
    Ok(())
}
