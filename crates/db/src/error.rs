//! Store error classification.
//!
//! Every `DbErr` coming out of the query layer is sorted into one of a few
//! buckets before it reaches the coordinator. Only [`QueryError::TransientConflict`]
//! is ever retried.

use sea_orm::{DbErr, RuntimeErr};
use simplebank_core::ledger::LedgerError;

/// Errors returned by the query layer.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The requested row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of row that was looked up.
        entity: &'static str,
        /// Identifier that was looked up.
        id: i64,
    },

    /// The store rejected a write because of a schema constraint.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A numeric value left the column's range.
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Serialization failure, deadlock or lock timeout. Safe to retry.
    #[error("Transient conflict: {0}")]
    TransientConflict(String),

    /// Any other store failure.
    #[error("Database error: {0}")]
    Database(DbErr),
}

impl QueryError {
    /// Shorthand for a missing account.
    pub fn account_not_found(id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity: "Account",
            id: id.into(),
        }
    }
}

/// How a store error code should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Integrity or check constraint.
    Constraint,
    /// Numeric value out of range.
    OutOfRange,
    /// Worth another attempt.
    Transient,
    /// Everything else.
    Other,
}

/// Classifies a Postgres SQLSTATE or SQLite result code.
///
/// Postgres:
/// - `23xxx` integrity constraint violations
/// - `22003` numeric value out of range
/// - `40001` serialization failure, `40P01` deadlock, `55P03` lock not available
///
/// SQLite:
/// - `5` busy, `6` locked (plus extended codes of either)
/// - `19` constraint, `2067` unique, `787` foreign key, `1555` primary key
pub fn classify_code(code: &str) -> ErrorClass {
    match code {
        "40001" | "40P01" | "55P03" => ErrorClass::Transient,
        "22003" => ErrorClass::OutOfRange,
        c if c.len() == 5 && c.starts_with("23") => ErrorClass::Constraint,
        c if c.len() < 5 => match c.parse::<i32>() {
            // Extended SQLite codes keep the primary code in the low byte.
            Ok(n) if matches!(n & 0xff, 5 | 6) => ErrorClass::Transient,
            Ok(n) if n & 0xff == 19 => ErrorClass::Constraint,
            _ => ErrorClass::Other,
        },
        _ => ErrorClass::Other,
    }
}

fn database_code(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(e) => e
            .as_database_error()
            .and_then(|db| db.code())
            .map(std::borrow::Cow::into_owned),
        RuntimeErr::Internal(_) => None,
    }
}

impl From<DbErr> for QueryError {
    fn from(err: DbErr) -> Self {
        match database_code(&err).map(|code| classify_code(&code)) {
            Some(ErrorClass::Constraint) => Self::ConstraintViolation(err.to_string()),
            Some(ErrorClass::OutOfRange) => Self::OutOfRange(err.to_string()),
            Some(ErrorClass::Transient) => Self::TransientConflict(err.to_string()),
            _ => Self::Database(err),
        }
    }
}

impl From<QueryError> for LedgerError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound { entity, id } => Self::NotFound { entity, id },
            QueryError::ConstraintViolation(msg) => Self::ConstraintViolation(msg),
            QueryError::OutOfRange(msg) => Self::InvalidArgument(msg),
            QueryError::TransientConflict(msg) => Self::TransientConflict(msg),
            QueryError::Database(e) => Self::Store(e.to_string()),
        }
    }
}
