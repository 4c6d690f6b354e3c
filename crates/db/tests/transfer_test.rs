//! Transfer coordinator integration tests.
//!
//! Each property runs under both balance strategies.

mod common;

use common::{
    balance_of, count_entries, count_transfers, id_of, open_account, setup_db, total_balance,
};
use rand::Rng;
use rstest::rstest;
use sea_orm::DatabaseConnection;
use simplebank_core::ledger::{LedgerError, RetryPolicy, TransferParams};
use simplebank_db::{
    EntryRepository, TransferContext, TransferCoordinator, TransferFilter, TransferRepository,
};
use simplebank_shared::types::{AccountId, BalanceStrategy, EntryId, TransferId};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

fn coordinator(db: &DatabaseConnection, strategy: BalanceStrategy) -> TransferCoordinator {
    TransferCoordinator::new(db.clone()).with_strategy(strategy)
}

#[rstest]
#[case::atomic_increment(BalanceStrategy::AtomicIncrement)]
#[case::ordered_locking(BalanceStrategy::OrderedLocking)]
#[tokio::test]
async fn test_transfer_scenario(#[case] strategy: BalanceStrategy) {
    let db = setup_db().await;
    let a = open_account(&db, "a", 100).await;
    let b = open_account(&db, "b", 50).await;

    let result = coordinator(&db, strategy)
        .execute_transfer(
            TransferParams::new(id_of(&a), id_of(&b), 30),
            &TransferContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.transfer.from_account_id, a.id);
    assert_eq!(result.transfer.to_account_id, b.id);
    assert_eq!(result.transfer.amount, 30);
    assert_eq!(result.from_account.id, a.id);
    assert_eq!(result.from_account.balance, 70);
    assert_eq!(result.to_account.id, b.id);
    assert_eq!(result.to_account.balance, 80);
    assert_eq!(result.from_entry.account_id, a.id);
    assert_eq!(result.from_entry.amount, -30);
    assert_eq!(result.to_entry.account_id, b.id);
    assert_eq!(result.to_entry.amount, 30);

    assert_eq!(balance_of(&db, id_of(&a)).await, 70);
    assert_eq!(balance_of(&db, id_of(&b)).await, 80);
}

#[rstest]
#[case::atomic_increment(BalanceStrategy::AtomicIncrement)]
#[case::ordered_locking(BalanceStrategy::OrderedLocking)]
#[tokio::test]
async fn test_transfer_from_higher_to_lower_id(#[case] strategy: BalanceStrategy) {
    let db = setup_db().await;
    let low = open_account(&db, "low", 0).await;
    let high = open_account(&db, "high", 40).await;

    let result = coordinator(&db, strategy)
        .execute_transfer(
            TransferParams::new(id_of(&high), id_of(&low), 15),
            &TransferContext::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.from_account.id, high.id);
    assert_eq!(result.from_account.balance, 25);
    assert_eq!(result.to_account.id, low.id);
    assert_eq!(result.to_account.balance, 15);
}

#[tokio::test]
async fn test_overdraft_is_allowed() {
    let db = setup_db().await;
    let a = open_account(&db, "a", 10).await;
    let b = open_account(&db, "b", 0).await;

    let result = TransferCoordinator::new(db.clone())
        .execute_transfer(
            TransferParams::new(id_of(&a), id_of(&b), 25),
            &TransferContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(result.from_account.balance, -15);
}

#[rstest]
#[case::same_account(1, 1, 10)]
#[case::zero_amount(1, 2, 0)]
#[case::negative_amount(1, 2, -5)]
#[tokio::test]
async fn test_invalid_transfer_never_touches_store(
    #[case] from: i64,
    #[case] to: i64,
    #[case] amount: i64,
) {
    // A disconnected handle fails on any store access, so getting
    // InvalidArgument back proves validation ran first.
    let coordinator = TransferCoordinator::new(DatabaseConnection::Disconnected);
    let err = coordinator
        .execute_transfer(
            TransferParams::new(AccountId::new(from), AccountId::new(to), amount),
            &TransferContext::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)), "{err:?}");
}

#[tokio::test]
async fn test_self_transfer_leaves_store_unchanged() {
    let db = setup_db().await;
    let a = open_account(&db, "a", 100).await;

    let err = TransferCoordinator::new(db.clone())
        .execute_transfer(
            TransferParams::new(id_of(&a), id_of(&a), 10),
            &TransferContext::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::InvalidArgument(_)));
    assert_eq!(balance_of(&db, id_of(&a)).await, 100);
    assert_eq!(count_transfers(&db).await, 0);
    assert_eq!(count_entries(&db).await, 0);
}

#[rstest]
#[case::atomic_increment(BalanceStrategy::AtomicIncrement)]
#[case::ordered_locking(BalanceStrategy::OrderedLocking)]
#[tokio::test]
async fn test_failed_transfer_is_atomic(#[case] strategy: BalanceStrategy) {
    let db = setup_db().await;
    let a = open_account(&db, "a", 100).await;
    let missing = AccountId::new(a.id + 1000);

    let err = coordinator(&db, strategy)
        .execute_transfer(
            TransferParams::new(id_of(&a), missing, 10),
            &TransferContext::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::ConstraintViolation(_)), "{err:?}");
    assert!(!err.is_retryable());
    assert_eq!(balance_of(&db, id_of(&a)).await, 100);
    assert_eq!(count_transfers(&db).await, 0);
    assert_eq!(count_entries(&db).await, 0);
}

#[rstest]
#[case::credit_above_max(BalanceStrategy::AtomicIncrement, 0, i64::MAX)]
#[case::debit_below_min(BalanceStrategy::AtomicIncrement, i64::MIN, 0)]
#[case::locked_credit_above_max(BalanceStrategy::OrderedLocking, 0, i64::MAX)]
#[case::locked_debit_below_min(BalanceStrategy::OrderedLocking, i64::MIN, 0)]
#[tokio::test]
async fn test_overflowing_transfer_is_invalid_and_rolls_back(
    #[case] strategy: BalanceStrategy,
    #[case] from_balance: i64,
    #[case] to_balance: i64,
) {
    let db = setup_db().await;
    let a = open_account(&db, "a", from_balance).await;
    let b = open_account(&db, "b", to_balance).await;

    let err = coordinator(&db, strategy)
        .execute_transfer(
            TransferParams::new(id_of(&a), id_of(&b), 1),
            &TransferContext::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::InvalidArgument(_)), "{err:?}");
    assert_eq!(err.http_status_code(), 400);
    assert_eq!(balance_of(&db, id_of(&a)).await, from_balance);
    assert_eq!(balance_of(&db, id_of(&b)).await, to_balance);
    assert_eq!(count_transfers(&db).await, 0);
    assert_eq!(count_entries(&db).await, 0);
}

#[rstest]
#[case::atomic_increment(BalanceStrategy::AtomicIncrement)]
#[case::ordered_locking(BalanceStrategy::OrderedLocking)]
#[tokio::test]
async fn test_read_back_matches_result(#[case] strategy: BalanceStrategy) {
    let db = setup_db().await;
    let a = open_account(&db, "a", 100).await;
    let b = open_account(&db, "b", 0).await;

    let result = coordinator(&db, strategy)
        .execute_transfer(
            TransferParams::new(id_of(&a), id_of(&b), 42),
            &TransferContext::new(),
        )
        .await
        .unwrap();

    let transfer = TransferRepository::new(&db)
        .get_transfer(TransferId::new(result.transfer.id))
        .await
        .unwrap();
    let entries = EntryRepository::new(&db);
    let from_entry = entries
        .get_entry(EntryId::new(result.from_entry.id))
        .await
        .unwrap();
    let to_entry = entries
        .get_entry(EntryId::new(result.to_entry.id))
        .await
        .unwrap();

    assert_eq!(transfer, result.transfer);
    assert_eq!(from_entry, result.from_entry);
    assert_eq!(to_entry, result.to_entry);
}

#[rstest]
#[case::atomic_increment(BalanceStrategy::AtomicIncrement)]
#[case::ordered_locking(BalanceStrategy::OrderedLocking)]
#[tokio::test]
async fn test_conservation_and_entry_pairing(#[case] strategy: BalanceStrategy) {
    let db = setup_db().await;
    let mut accounts = Vec::new();
    for (i, balance) in [500, 20, 0, 130].into_iter().enumerate() {
        accounts.push(id_of(&open_account(&db, &format!("owner-{i}"), balance).await));
    }
    let initial_total = total_balance(&db).await;

    let plan: Vec<TransferParams> = {
        let mut rng = rand::rng();
        (0..40)
            .map(|_| {
                let from = rng.random_range(0..accounts.len());
                let mut to = rng.random_range(0..accounts.len() - 1);
                if to >= from {
                    to += 1;
                }
                TransferParams::new(accounts[from], accounts[to], rng.random_range(1..=75))
            })
            .collect()
    };

    let coordinator = coordinator(&db, strategy);
    for params in &plan {
        coordinator
            .execute_transfer(*params, &TransferContext::new())
            .await
            .unwrap();
        assert_eq!(total_balance(&db).await, initial_total);
    }

    let transfers = TransferRepository::new(&db)
        .list_transfers(TransferFilter::default(), 100, 0)
        .await
        .unwrap();
    assert_eq!(transfers.len(), plan.len());
    assert_eq!(count_entries(&db).await, plan.len() * 2);

    let entries = EntryRepository::new(&db);
    for transfer in &transfers {
        let debits = entries
            .list_entries(AccountId::new(transfer.from_account_id), 1000, 0)
            .await
            .unwrap();
        let credits = entries
            .list_entries(AccountId::new(transfer.to_account_id), 1000, 0)
            .await
            .unwrap();
        assert!(debits.iter().any(|e| e.amount == -transfer.amount));
        assert!(credits.iter().any(|e| e.amount == transfer.amount));
    }

    // Every balance equals its opening balance plus its entries.
    for (id, opening) in accounts.iter().zip([500, 20, 0, 130]) {
        let sum: i64 = entries
            .list_entries(*id, 1000, 0)
            .await
            .unwrap()
            .iter()
            .map(|e| e.amount)
            .sum();
        assert_eq!(balance_of(&db, *id).await, opening + sum);
    }
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let db = setup_db().await;
    let a = open_account(&db, "a", 100).await;
    let b = open_account(&db, "b", 0).await;

    let token = CancellationToken::new();
    token.cancel();
    let ctx = TransferContext::new().with_cancellation(token);

    let err = TransferCoordinator::new(db.clone())
        .execute_transfer(TransferParams::new(id_of(&a), id_of(&b), 10), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Cancelled(_)), "{err:?}");
    assert_eq!(err.http_status_code(), 504);
    assert_eq!(balance_of(&db, id_of(&a)).await, 100);
    assert_eq!(count_transfers(&db).await, 0);
    assert_eq!(count_entries(&db).await, 0);
}

#[tokio::test]
async fn test_expired_deadline_rolls_back() {
    let db = setup_db().await;
    let a = open_account(&db, "a", 100).await;
    let b = open_account(&db, "b", 0).await;

    let ctx = TransferContext::new()
        .with_trace_id("deadline-test")
        .with_deadline(Instant::now());

    let err = TransferCoordinator::new(db.clone())
        .execute_transfer(TransferParams::new(id_of(&a), id_of(&b), 10), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Cancelled(_)), "{err:?}");
    assert_eq!(balance_of(&db, id_of(&b)).await, 0);
    assert_eq!(count_transfers(&db).await, 0);
}

/// Cancels a token as soon as the coordinator reports both entries written.
struct CancelAfterEntries {
    token: CancellationToken,
}

impl<S: Subscriber> Layer<S> for CancelAfterEntries {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().fields().field("to_entry_id").is_some() {
            self.token.cancel();
        }
    }
}

#[rstest]
#[case::atomic_increment(BalanceStrategy::AtomicIncrement)]
#[case::ordered_locking(BalanceStrategy::OrderedLocking)]
#[tokio::test]
async fn test_cancelled_mid_transaction_rolls_back(#[case] strategy: BalanceStrategy) {
    let db = setup_db().await;
    let a = open_account(&db, "a", 100).await;
    let b = open_account(&db, "b", 0).await;

    let token = CancellationToken::new();
    let ctx = TransferContext::new().with_cancellation(token.clone());
    let subscriber = tracing_subscriber::registry().with(CancelAfterEntries {
        token: token.clone(),
    });

    let err = coordinator(&db, strategy)
        .execute_transfer(TransferParams::new(id_of(&a), id_of(&b), 10), &ctx)
        .with_subscriber(subscriber)
        .await
        .unwrap_err();

    // The transfer record and both entries were written before the signal.
    assert!(token.is_cancelled());
    assert!(matches!(err, LedgerError::Cancelled(_)), "{err:?}");
    assert_eq!(balance_of(&db, id_of(&a)).await, 100);
    assert_eq!(balance_of(&db, id_of(&b)).await, 0);
    assert_eq!(count_transfers(&db).await, 0);
    assert_eq!(count_entries(&db).await, 0);
}

#[tokio::test]
async fn test_no_retry_policy_still_commits() {
    let db = setup_db().await;
    let a = open_account(&db, "a", 100).await;
    let b = open_account(&db, "b", 0).await;

    let coordinator = TransferCoordinator::new(db.clone()).with_policy(RetryPolicy::no_retry());
    assert_eq!(coordinator.policy().max_attempts, 1);

    let result = coordinator
        .execute_transfer(
            TransferParams::new(id_of(&a), id_of(&b), 1),
            &TransferContext::new().with_trace_id("req-7"),
        )
        .await
        .unwrap();
    assert_eq!(result.to_account.balance, 1);
}
