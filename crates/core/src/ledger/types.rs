//! Input types for account opening and transfers.

use serde::{Deserialize, Serialize};
use simplebank_shared::types::{AccountId, CurrencyCode};

/// Parameters of one funds transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    /// Account the money leaves.
    pub from_account_id: AccountId,
    /// Account the money arrives in.
    pub to_account_id: AccountId,
    /// Amount in minor currency units. Must be positive.
    pub amount: i64,
}

impl TransferParams {
    /// Creates transfer parameters.
    #[must_use]
    pub const fn new(from_account_id: AccountId, to_account_id: AccountId, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }
}

/// Parameters for opening an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Account holder.
    pub owner: String,
    /// Opening balance in minor currency units.
    pub balance: i64,
    /// Currency, fixed for the account's lifetime.
    pub currency: CurrencyCode,
}

impl NewAccount {
    /// Creates opening parameters with a zero balance.
    #[must_use]
    pub fn with_zero_balance(owner: impl Into<String>, currency: CurrencyCode) -> Self {
        Self {
            owner: owner.into(),
            balance: 0,
            currency,
        }
    }
}
