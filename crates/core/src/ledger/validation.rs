//! Precondition checks, run before any store transaction is opened.

use super::error::LedgerError;
use super::types::{NewAccount, TransferParams};

/// Longest owner name accepted.
pub const MAX_OWNER_LEN: usize = 255;

/// Validates a transfer request.
///
/// # Errors
///
/// Returns `LedgerError::InvalidArgument` if the amount is not positive or the
/// source and destination are the same account.
pub fn validate_transfer(params: &TransferParams) -> Result<(), LedgerError> {
    if params.amount <= 0 {
        return Err(LedgerError::InvalidArgument(format!(
            "amount must be positive, got {}",
            params.amount
        )));
    }

    if params.from_account_id == params.to_account_id {
        return Err(LedgerError::InvalidArgument(format!(
            "cannot transfer from account {} to itself",
            params.from_account_id
        )));
    }

    Ok(())
}

/// Validates account opening parameters.
///
/// # Errors
///
/// Returns `LedgerError::InvalidArgument` if the owner is blank or too long.
pub fn validate_new_account(account: &NewAccount) -> Result<(), LedgerError> {
    let owner = account.owner.trim();
    if owner.is_empty() {
        return Err(LedgerError::InvalidArgument(
            "owner must not be empty".to_string(),
        ));
    }
    if owner.len() > MAX_OWNER_LEN {
        return Err(LedgerError::InvalidArgument(format!(
            "owner must be at most {MAX_OWNER_LEN} bytes"
        )));
    }
    Ok(())
}
