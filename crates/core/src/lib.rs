//! Core transfer logic for Simplebank.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Everything the transfer coordinator decides without touching the store lives
//! here.
//!
//! # Modules
//!
//! - `ledger` - Transfer parameters, error taxonomy, lock ordering, retry policy
//!   and the per-transfer attempt state machine

pub mod ledger;
