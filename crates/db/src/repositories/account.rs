//! Account queries.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::Expr,
};
use simplebank_core::ledger::NewAccount;
use simplebank_shared::types::AccountId;

use crate::entities::accounts;
use crate::error::QueryError;

/// Account repository scoped to one connection or transaction.
#[derive(Debug, Clone, Copy)]
pub struct AccountRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C> AccountRepository<'c, C> {
    /// Creates a repository over `conn`.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> AccountRepository<'_, C> {
    /// Inserts a new account.
    ///
    /// # Errors
    ///
    /// `ConstraintViolation` if the owner already holds an account in this
    /// currency.
    pub async fn create_account(&self, input: &NewAccount) -> Result<accounts::Model, QueryError> {
        let account = accounts::ActiveModel {
            owner: Set(input.owner.clone()),
            balance: Set(input.balance),
            currency: Set(input.currency.as_str().to_string()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(account.insert(self.conn).await?)
    }

    /// Fetches an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<accounts::Model, QueryError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await?
            .ok_or_else(|| QueryError::account_not_found(id))
    }

    /// Fetches an account and takes an exclusive row lock on it.
    ///
    /// The lock is held until the enclosing transaction ends. Stores without
    /// row locks (SQLite) serialize whole write transactions instead, and the
    /// `FOR UPDATE` clause is omitted for them.
    pub async fn get_account_for_update(
        &self,
        id: AccountId,
    ) -> Result<accounts::Model, QueryError> {
        accounts::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(self.conn)
            .await?
            .ok_or_else(|| QueryError::account_not_found(id))
    }

    /// Overwrites an account's balance.
    pub async fn update_account_balance(
        &self,
        id: AccountId,
        balance: i64,
    ) -> Result<accounts::Model, QueryError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(balance))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(QueryError::account_not_found(id));
        }
        self.get_account(id).await
    }

    /// Adds `delta` to an account's balance in a single statement.
    ///
    /// `balance = balance + delta` is evaluated by the store, so no read of
    /// the old value is needed and no lock is held between statements. The
    /// update only matches while the result stays within `i64`.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `OutOfRange` if the new balance would overflow.
    pub async fn add_account_balance(
        &self,
        id: AccountId,
        delta: i64,
    ) -> Result<accounts::Model, QueryError> {
        let in_range = if delta >= 0 {
            accounts::Column::Balance.lte(i64::MAX - delta)
        } else {
            accounts::Column::Balance.gte(i64::MIN - delta)
        };

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(in_range)
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            // Tell a missing row apart from one the bound excluded.
            self.get_account(id).await?;
            return Err(QueryError::OutOfRange(format!(
                "balance of account {id} would overflow"
            )));
        }
        self.get_account(id).await
    }

    /// Lists accounts ordered by ID ascending.
    ///
    /// Pages are not a snapshot: concurrent inserts may shift later pages.
    pub async fn list_accounts(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<accounts::Model>, QueryError> {
        Ok(accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.conn)
            .await?)
    }

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `ConstraintViolation` while entries or transfers
    /// still reference it.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), QueryError> {
        let result = accounts::Entity::delete_by_id(id.into_inner())
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(QueryError::account_not_found(id));
        }
        Ok(())
    }
}
