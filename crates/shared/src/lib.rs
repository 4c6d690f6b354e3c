//! Shared types, errors, and configuration for Simplebank.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Currency codes
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, ServerConfig, TransferConfig};
pub use error::{AppError, AppResult};
