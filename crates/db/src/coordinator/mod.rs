//! Transfer coordinator.
//!
//! Runs one funds transfer as a single store transaction:
//!
//! 1. create the transfer record
//! 2. create the debit entry (`-amount`) for the source account
//! 3. create the credit entry (`+amount`) for the destination account
//! 4. adjust both balances, lower account id first
//! 5. commit, or roll back on any failure
//!
//! Transient conflicts (deadlock, serialization failure, lock timeout) restart
//! the whole protocol in a fresh transaction with exponential backoff. The
//! coordinator keeps no shared mutable state; all serialization happens in the
//! store.

mod context;
mod retry;

pub use context::TransferContext;

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, IsolationLevel, TransactionTrait};
use serde::Serialize;
use simplebank_core::ledger::{
    LedgerError, LockOrder, RetryPolicy, TransferParams, plan_entries, validate_transfer,
};
use simplebank_shared::TransferConfig;
use simplebank_shared::types::{AccountId, BalanceStrategy};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::entities::{accounts, entries, transfers};
use crate::error::QueryError;
use crate::repositories::{AccountRepository, EntryRepository, TransferRepository};

use retry::run_with_retry;

/// Everything a committed transfer produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    /// The transfer record.
    pub transfer: transfers::Model,
    /// Source account after the debit.
    pub from_account: accounts::Model,
    /// Destination account after the credit.
    pub to_account: accounts::Model,
    /// Debit entry on the source account.
    pub from_entry: entries::Model,
    /// Credit entry on the destination account.
    pub to_entry: entries::Model,
}

/// Executes transfers atomically with retry on transient conflicts.
#[derive(Debug, Clone)]
pub struct TransferCoordinator {
    db: DatabaseConnection,
    policy: RetryPolicy,
    strategy: BalanceStrategy,
    isolation: Option<IsolationLevel>,
}

impl TransferCoordinator {
    /// Creates a coordinator with the default retry policy and the atomic
    /// increment strategy.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            policy: RetryPolicy::default(),
            strategy: BalanceStrategy::default(),
            isolation: None,
        }
    }

    /// Creates a coordinator from transfer configuration.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &TransferConfig) -> Self {
        Self::new(db)
            .with_policy(RetryPolicy::from_config(config))
            .with_strategy(config.balance_strategy)
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Selects how balances are adjusted.
    #[must_use]
    pub fn with_strategy(mut self, strategy: BalanceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Opens every transaction at `level` instead of the store default.
    #[must_use]
    pub fn with_isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    /// The underlying connection pool.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Active retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Active balance strategy.
    pub fn strategy(&self) -> BalanceStrategy {
        self.strategy
    }

    /// Moves `amount` from one account to another.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the accounts are equal or `amount <= 0`; no
    ///   transaction is opened
    /// - `ConstraintViolation` if an account does not exist
    /// - `ExhaustedRetries` if every attempt hit a transient conflict
    /// - `Cancelled` if `ctx` fired before commit
    /// - `TransactionAbort` if rolling back a failed attempt failed too
    pub async fn execute_transfer(
        &self,
        params: TransferParams,
        ctx: &TransferContext,
    ) -> Result<TransferResult, LedgerError> {
        validate_transfer(&params)?;

        let span = info_span!(
            "transfer",
            trace_id = ctx.trace_id().unwrap_or("-"),
            from_account_id = %params.from_account_id,
            to_account_id = %params.to_account_id,
            amount = params.amount,
            strategy = %self.strategy,
        );

        async move {
            let result = run_with_retry(&self.policy, ctx, move |attempt| {
                self.attempt(params, ctx, attempt)
            })
            .await;

            match &result {
                Ok(done) => info!(
                    transfer_id = done.transfer.id,
                    from_balance = done.from_account.balance,
                    to_balance = done.to_account.balance,
                    "Transfer committed"
                ),
                Err(err) => warn!(error = %err, code = err.error_code(), "Transfer failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// One attempt: a fresh transaction running the whole protocol.
    async fn attempt(
        &self,
        params: TransferParams,
        ctx: &TransferContext,
        attempt: u32,
    ) -> Result<TransferResult, LedgerError> {
        debug!(attempt, "Opening store transaction");

        let txn = tokio::select! {
            biased;
            () = ctx.cancelled() => {
                return Err(LedgerError::Cancelled(ctx.reason().to_string()));
            }
            txn = self.begin() => txn.map_err(QueryError::from)?,
        };

        let outcome = tokio::select! {
            biased;
            () = ctx.cancelled() => Err(LedgerError::Cancelled(ctx.reason().to_string())),
            result = self.apply(&txn, &params) => result,
        };

        // A signal that fired after the last write still wins over commit.
        let outcome = outcome.and_then(|done| {
            if ctx.is_cancelled() {
                Err(LedgerError::Cancelled(ctx.reason().to_string()))
            } else {
                Ok(done)
            }
        });

        match outcome {
            Ok(done) => {
                txn.commit().await.map_err(QueryError::from)?;
                debug!(attempt, transfer_id = done.transfer.id, "Committed");
                Ok(done)
            }
            Err(cause) => Err(roll_back(txn, cause, attempt).await),
        }
    }

    async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        match self.isolation {
            Some(level) => self.db.begin_with_config(Some(level), None).await,
            None => self.db.begin().await,
        }
    }

    /// Steps 1-4 inside `txn`.
    async fn apply(
        &self,
        txn: &DatabaseTransaction,
        params: &TransferParams,
    ) -> Result<TransferResult, LedgerError> {
        let transfer = TransferRepository::new(txn).create_transfer(params).await?;
        debug!(transfer_id = transfer.id, "Transfer record created");

        let [debit, credit] = plan_entries(params);
        let entries = EntryRepository::new(txn);
        let from_entry = entries.create_entry(debit.account_id, debit.amount).await?;
        let to_entry = entries.create_entry(credit.account_id, credit.amount).await?;
        debug!(
            from_entry_id = from_entry.id,
            to_entry_id = to_entry.id,
            "Entries created"
        );

        let (from_account, to_account) = match self.strategy {
            BalanceStrategy::AtomicIncrement => add_balances(txn, params).await?,
            BalanceStrategy::OrderedLocking => lock_and_set_balances(txn, params).await?,
        };
        debug!(
            from_balance = from_account.balance,
            to_balance = to_account.balance,
            "Balances adjusted"
        );

        Ok(TransferResult {
            transfer,
            from_account,
            to_account,
            from_entry,
            to_entry,
        })
    }
}

/// Signed balance change `params` applies to `id`.
fn delta_for(params: &TransferParams, id: AccountId) -> i64 {
    if id == params.from_account_id {
        -params.amount
    } else {
        params.amount
    }
}

/// Puts the pair back into (from, to) order.
fn by_role(
    order: LockOrder,
    params: &TransferParams,
    first: accounts::Model,
    second: accounts::Model,
) -> (accounts::Model, accounts::Model) {
    if order.locks_first(params.from_account_id) {
        (first, second)
    } else {
        (second, first)
    }
}

/// Atomic increment path. Each update is a single statement, and the lower id
/// is still updated first so that row locks held until commit are always taken
/// in the same order.
async fn add_balances(
    txn: &DatabaseTransaction,
    params: &TransferParams,
) -> Result<(accounts::Model, accounts::Model), LedgerError> {
    let accounts = AccountRepository::new(txn);
    let order = LockOrder::for_transfer(params);

    let first = accounts
        .add_account_balance(order.first, delta_for(params, order.first))
        .await?;
    let second = accounts
        .add_account_balance(order.second, delta_for(params, order.second))
        .await?;

    Ok(by_role(order, params, first, second))
}

/// Read-modify-write path under exclusive row locks taken in ascending id
/// order.
async fn lock_and_set_balances(
    txn: &DatabaseTransaction,
    params: &TransferParams,
) -> Result<(accounts::Model, accounts::Model), LedgerError> {
    let accounts = AccountRepository::new(txn);
    let order = LockOrder::for_transfer(params);

    let first = accounts.get_account_for_update(order.first).await?;
    let second = accounts.get_account_for_update(order.second).await?;
    debug!(first = %order.first, second = %order.second, "Rows locked");

    let first = accounts
        .update_account_balance(order.first, adjusted(&first, params)?)
        .await?;
    let second = accounts
        .update_account_balance(order.second, adjusted(&second, params)?)
        .await?;

    Ok(by_role(order, params, first, second))
}

/// New balance of a locked account after the transfer.
fn adjusted(account: &accounts::Model, params: &TransferParams) -> Result<i64, LedgerError> {
    let id = AccountId::new(account.id);
    account
        .balance
        .checked_add(delta_for(params, id))
        .ok_or_else(|| {
            LedgerError::InvalidArgument(format!("balance of account {id} would overflow"))
        })
}

/// Rolls `txn` back and returns the error to report for the attempt.
async fn roll_back(txn: DatabaseTransaction, cause: LedgerError, attempt: u32) -> LedgerError {
    match txn.rollback().await {
        Ok(()) => {
            debug!(attempt, error = %cause, "Rolled back");
            cause
        }
        Err(rollback) => {
            error!(
                attempt,
                error = %cause,
                rollback_error = %rollback,
                "Rollback failed"
            );
            LedgerError::TransactionAbort {
                cause: Box::new(cause),
                rollback: rollback.to_string(),
            }
        }
    }
}
