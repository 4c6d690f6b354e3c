//! Deterministic lock ordering for the read-modify-write balance path.
//!
//! Two transfers between the same pair of accounts in opposite directions
//! (A→B and B→A) deadlock if each locks its source first. Every transaction
//! therefore locks the lower account id first and the higher id second,
//! regardless of transfer direction. A single global order rules out circular
//! wait. It does not make waiting fair.

use simplebank_shared::types::AccountId;

use super::types::TransferParams;

/// The order in which a transfer's two account rows are locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOrder {
    /// Locked first (lower id).
    pub first: AccountId,
    /// Locked second (higher id).
    pub second: AccountId,
}

impl LockOrder {
    /// Orders two account ids.
    #[must_use]
    pub fn new(a: AccountId, b: AccountId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Lock order for a transfer.
    #[must_use]
    pub fn for_transfer(params: &TransferParams) -> Self {
        Self::new(params.from_account_id, params.to_account_id)
    }

    /// Returns the ids in locking order.
    #[must_use]
    pub const fn as_array(&self) -> [AccountId; 2] {
        [self.first, self.second]
    }

    /// Returns true if `id` is the row locked first.
    #[must_use]
    pub fn locks_first(&self, id: AccountId) -> bool {
        self.first == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lower_id_first() {
        let order = LockOrder::new(AccountId::new(9), AccountId::new(4));
        assert_eq!(order.as_array(), [AccountId::new(4), AccountId::new(9)]);
        assert!(order.locks_first(AccountId::new(4)));
    }

    #[test]
    fn test_opposite_directions_share_order() {
        let a_to_b = TransferParams::new(AccountId::new(1), AccountId::new(2), 10);
        let b_to_a = TransferParams::new(AccountId::new(2), AccountId::new(1), 10);
        assert_eq!(LockOrder::for_transfer(&a_to_b), LockOrder::for_transfer(&b_to_a));
    }

    proptest! {
        #[test]
        fn prop_order_is_symmetric(a in any::<i64>(), b in any::<i64>()) {
            let ab = LockOrder::new(AccountId::new(a), AccountId::new(b));
            let ba = LockOrder::new(AccountId::new(b), AccountId::new(a));
            prop_assert_eq!(ab, ba);
            prop_assert!(ab.first <= ab.second);
        }

        #[test]
        fn prop_order_keeps_both_ids(a in any::<i64>(), b in any::<i64>()) {
            let order = LockOrder::new(AccountId::new(a), AccountId::new(b));
            let mut got = [order.first.into_inner(), order.second.into_inner()];
            let mut want = [a, b];
            got.sort_unstable();
            want.sort_unstable();
            prop_assert_eq!(got, want);
        }
    }
}
