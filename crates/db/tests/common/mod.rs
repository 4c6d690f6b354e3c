//! Shared helpers for database integration tests.
//!
//! Every test gets its own in-memory SQLite store with migrations applied. The
//! pool holds a single connection, so the database lives as long as the pool
//! and concurrent transfers queue for the connection.

#![allow(dead_code)]

use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait};
use simplebank_core::ledger::NewAccount;
use simplebank_db::AccountRepository;
use simplebank_db::entities::{accounts, entries, transfers};
use simplebank_db::migration::{Migrator, MigratorTrait};
use simplebank_shared::types::{AccountId, CurrencyCode};

/// Opens a fresh, migrated in-memory store.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory SQLite");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");
    db
}

pub fn usd() -> CurrencyCode {
    CurrencyCode::parse("USD").unwrap()
}

/// Opens a USD account with the given opening balance.
pub async fn open_account(db: &DatabaseConnection, owner: &str, balance: i64) -> accounts::Model {
    let input = NewAccount {
        owner: owner.to_string(),
        balance,
        currency: usd(),
    };
    AccountRepository::new(db)
        .create_account(&input)
        .await
        .expect("Failed to create account")
}

pub fn id_of(account: &accounts::Model) -> AccountId {
    AccountId::new(account.id)
}

pub async fn balance_of(db: &DatabaseConnection, id: AccountId) -> i64 {
    AccountRepository::new(db)
        .get_account(id)
        .await
        .expect("Account should exist")
        .balance
}

/// Sum of every account balance.
pub async fn total_balance(db: &DatabaseConnection) -> i64 {
    accounts::Entity::find()
        .all(db)
        .await
        .unwrap()
        .iter()
        .map(|a| a.balance)
        .sum()
}

pub async fn count_transfers(db: &DatabaseConnection) -> usize {
    transfers::Entity::find().all(db).await.unwrap().len()
}

pub async fn count_entries(db: &DatabaseConnection) -> usize {
    entries::Entity::find().all(db).await.unwrap().len()
}
