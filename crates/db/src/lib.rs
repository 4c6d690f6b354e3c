//! Database layer for the ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for accounts, entries and transfers
//! - The query layer (one repository per table, usable inside transactions)
//! - Store error classification
//! - The transfer coordinator
//! - Database migrations

pub mod coordinator;
pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;

pub use coordinator::{TransferContext, TransferCoordinator, TransferResult};
pub use error::QueryError;
pub use repositories::{AccountRepository, EntryRepository, TransferFilter, TransferRepository};

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use simplebank_shared::DatabaseConfig;
use tracing::info;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(
        max_connections = config.max_connections,
        backend = ?db.get_database_backend(),
        "Database pool ready"
    );
    Ok(db)
}
