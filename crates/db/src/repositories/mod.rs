//! Query layer.
//!
//! Repositories borrow a connection handle rather than owning one, so the same
//! code runs against the pool or inside a caller-owned transaction. Any
//! `C: ConnectionTrait` works: `DatabaseConnection` or `DatabaseTransaction`.

pub mod account;
pub mod entry;
pub mod transfer;

pub use account::AccountRepository;
pub use entry::EntryRepository;
pub use transfer::{TransferFilter, TransferRepository};
