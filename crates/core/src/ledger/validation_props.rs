//! Property-based tests for transfer preconditions.
//!
//! - Every non-positive amount is rejected
//! - Every self-transfer is rejected
//! - Every positive amount between distinct accounts is accepted, and its
//!   entry pair nets to zero

use proptest::prelude::*;
use simplebank_shared::types::AccountId;

use super::entry::plan_entries;
use super::error::LedgerError;
use super::types::TransferParams;
use super::validation::validate_transfer;

/// Strategy for distinct account id pairs.
fn distinct_ids() -> impl Strategy<Value = (i64, i64)> {
    (1i64..10_000, 1i64..10_000).prop_filter("ids must differ", |(a, b)| a != b)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_non_positive_amount_rejected(
        (from, to) in distinct_ids(),
        amount in i64::MIN..=0,
    ) {
        let params = TransferParams::new(AccountId::new(from), AccountId::new(to), amount);
        let is_invalid = matches!(
            validate_transfer(&params),
            Err(LedgerError::InvalidArgument(_))
        );
        prop_assert!(is_invalid);
    }

    #[test]
    fn prop_self_transfer_rejected(id in 1i64..10_000, amount in 1i64..1_000_000) {
        let params = TransferParams::new(AccountId::new(id), AccountId::new(id), amount);
        let is_invalid = matches!(
            validate_transfer(&params),
            Err(LedgerError::InvalidArgument(_))
        );
        prop_assert!(is_invalid);
    }

    #[test]
    fn prop_valid_transfer_nets_to_zero(
        (from, to) in distinct_ids(),
        amount in 1i64..1_000_000_000,
    ) {
        let params = TransferParams::new(AccountId::new(from), AccountId::new(to), amount);
        prop_assert!(validate_transfer(&params).is_ok());

        let [debit, credit] = plan_entries(&params);
        prop_assert_eq!(debit.amount, -amount);
        prop_assert_eq!(credit.amount, amount);
        prop_assert_eq!(debit.amount + credit.amount, 0);
    }
}
