//! Ledger error types.
//!
//! One taxonomy is shared by the query layer, the transfer coordinator and the
//! service facade. Only `TransientConflict` is ever recovered locally (by the
//! coordinator's retry loop); every other kind travels up unchanged.

use simplebank_shared::AppError;
use thiserror::Error;

use super::state::InvalidTransition;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Caller Errors ==========
    /// Bad request shape or range. Rejected before any store access.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced account or record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// Key that was looked up.
        id: i64,
    },

    /// Uniqueness or foreign-key constraint rejected the write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    // ========== Concurrency Errors ==========
    /// Lock-wait timeout, serialization failure or detected deadlock.
    #[error("Transient conflict: {0}")]
    TransientConflict(String),

    /// Every attempt in the budget ended in a transient conflict.
    #[error("Gave up after {attempts} attempts: {last}")]
    ExhaustedRetries {
        /// Number of attempts made.
        attempts: u32,
        /// The conflict that ended the final attempt.
        #[source]
        last: Box<LedgerError>,
    },

    // ========== Transaction Errors ==========
    /// Rolling back after a mid-transaction failure failed as well.
    #[error("Transaction aborted: {cause}; rollback failed: {rollback}")]
    TransactionAbort {
        /// The failure that triggered the rollback.
        #[source]
        cause: Box<LedgerError>,
        /// Why the rollback itself failed.
        rollback: String,
    },

    /// The caller's cancellation signal or deadline fired before commit.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    // ========== Store Errors ==========
    /// Any other store failure. Not retried.
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Shorthand for a missing account.
    #[must_use]
    pub fn account_not_found(id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity: "Account",
            id: id.into(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::TransientConflict(_) => "TRANSIENT_CONFLICT",
            Self::ExhaustedRetries { .. } => "EXHAUSTED_RETRIES",
            Self::TransactionAbort { .. } => "TRANSACTION_ABORTED",
            Self::Cancelled(_) => "CANCELLED",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidArgument(_) => 400,

            // 404 Not Found
            Self::NotFound { .. } => 404,

            // 409 Conflict - constraint and contention errors
            Self::ConstraintViolation(_) | Self::TransientConflict(_) => 409,

            // 503 Service Unavailable - contention outlasted the budget
            Self::ExhaustedRetries { .. } => 503,

            // 504 Gateway Timeout - deadline or cancellation
            Self::Cancelled(_) => 504,

            // 500 Internal Server Error
            Self::TransactionAbort { .. } | Self::Store(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientConflict(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::InvalidArgument(_) => Self::Validation(message),
            LedgerError::NotFound { .. } => Self::NotFound(message),
            LedgerError::ConstraintViolation(_) | LedgerError::TransientConflict(_) => {
                Self::Conflict(message)
            }
            LedgerError::ExhaustedRetries { .. } => Self::Unavailable(message),
            LedgerError::Cancelled(_) => Self::Timeout(message),
            LedgerError::TransactionAbort { .. } | LedgerError::Store(_) => {
                Self::Database(message)
            }
            LedgerError::Internal(_) => Self::Internal(message),
        }
    }
}

impl From<InvalidTransition> for LedgerError {
    fn from(err: InvalidTransition) -> Self {
        Self::Internal(err.to_string())
    }
}
