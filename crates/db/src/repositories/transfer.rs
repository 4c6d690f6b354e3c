//! Transfer record queries.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use simplebank_core::ledger::TransferParams;
use simplebank_shared::types::{AccountId, TransferId};

use crate::entities::transfers;
use crate::error::QueryError;

/// Filter for listing transfers. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferFilter {
    /// Only transfers leaving this account.
    pub from_account_id: Option<AccountId>,
    /// Only transfers arriving in this account.
    pub to_account_id: Option<AccountId>,
}

/// Transfer repository scoped to one connection or transaction.
#[derive(Debug, Clone, Copy)]
pub struct TransferRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C> TransferRepository<'c, C> {
    /// Creates a repository over `conn`.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> TransferRepository<'_, C> {
    /// Records a transfer. Balances and entries are not touched.
    pub async fn create_transfer(
        &self,
        params: &TransferParams,
    ) -> Result<transfers::Model, QueryError> {
        let transfer = transfers::ActiveModel {
            from_account_id: Set(params.from_account_id.into_inner()),
            to_account_id: Set(params.to_account_id.into_inner()),
            amount: Set(params.amount),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(transfer.insert(self.conn).await?)
    }

    /// Fetches a transfer by ID.
    pub async fn get_transfer(&self, id: TransferId) -> Result<transfers::Model, QueryError> {
        transfers::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await?
            .ok_or(QueryError::NotFound {
                entity: "Transfer",
                id: id.into_inner(),
            })
    }

    /// Lists transfers ordered by ID ascending.
    pub async fn list_transfers(
        &self,
        filter: TransferFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<transfers::Model>, QueryError> {
        let mut query = transfers::Entity::find();

        if let Some(from) = filter.from_account_id {
            query = query.filter(transfers::Column::FromAccountId.eq(from.into_inner()));
        }
        if let Some(to) = filter.to_account_id {
            query = query.filter(transfers::Column::ToAccountId.eq(to.into_inner()));
        }

        Ok(query
            .order_by_asc(transfers::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.conn)
            .await?)
    }
}
