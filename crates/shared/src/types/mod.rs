//! Common types used across the application.

pub mod balance;
pub mod currency;
pub mod id;
pub mod pagination;

pub use balance::BalanceStrategy;
pub use currency::{CurrencyCode, InvalidCurrency};
pub use id::*;
pub use pagination::PageRequest;
