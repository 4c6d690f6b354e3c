//! Entry sides and the matched entry pair of a transfer.

use serde::{Deserialize, Serialize};
use simplebank_shared::types::AccountId;

use super::types::TransferParams;

/// Side of a balance entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    /// Money leaves the account (negative amount).
    Debit,
    /// Money arrives in the account (positive amount).
    Credit,
}

impl EntrySide {
    /// Returns the signed entry amount for a positive transfer amount.
    #[must_use]
    pub const fn signed(self, amount: i64) -> i64 {
        match self {
            Self::Debit => -amount,
            Self::Credit => amount,
        }
    }

    /// Classifies a stored signed amount.
    #[must_use]
    pub const fn of(amount: i64) -> Self {
        if amount < 0 { Self::Debit } else { Self::Credit }
    }
}

/// One entry a transfer is about to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedEntry {
    /// Account the entry belongs to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: EntrySide,
    /// Signed delta applied to the account balance.
    pub amount: i64,
}

/// Returns the debit and credit entries for a transfer, in that order.
///
/// The two amounts always sum to zero.
#[must_use]
pub fn plan_entries(params: &TransferParams) -> [PlannedEntry; 2] {
    [
        PlannedEntry {
            account_id: params.from_account_id,
            side: EntrySide::Debit,
            amount: EntrySide::Debit.signed(params.amount),
        },
        PlannedEntry {
            account_id: params.to_account_id,
            side: EntrySide::Credit,
            amount: EntrySide::Credit.signed(params.amount),
        },
    ]
}
