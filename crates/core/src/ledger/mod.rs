//! Transfer logic that does not need the store.
//!
//! This module implements the store-agnostic half of the transfer coordinator:
//! - Transfer and account-opening parameters and their validation
//! - Entry sides (debit / credit) and the signed amounts they produce
//! - The error taxonomy shared by the query layer, coordinator and facade
//! - Deterministic lock ordering for the read-modify-write balance path
//! - Retry policy with exponential backoff and jitter
//! - The per-transfer attempt state machine

pub mod entry;
pub mod error;
pub mod locking;
pub mod retry;
pub mod state;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use entry::{EntrySide, PlannedEntry, plan_entries};
pub use error::LedgerError;
pub use locking::LockOrder;
pub use retry::RetryPolicy;
pub use state::{InvalidTransition, TransferExecution, TransferState};
pub use types::{NewAccount, TransferParams};
pub use validation::{validate_new_account, validate_transfer};
