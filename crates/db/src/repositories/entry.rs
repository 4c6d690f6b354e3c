//! Entry queries. Entries are append-only, so there is no update or delete.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use simplebank_shared::types::{AccountId, EntryId};

use crate::entities::entries;
use crate::error::QueryError;

/// Entry repository scoped to one connection or transaction.
#[derive(Debug, Clone, Copy)]
pub struct EntryRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C> EntryRepository<'c, C> {
    /// Creates a repository over `conn`.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

impl<C: ConnectionTrait> EntryRepository<'_, C> {
    /// Appends a signed balance entry for an account.
    ///
    /// # Errors
    ///
    /// `ConstraintViolation` if the account does not exist.
    pub async fn create_entry(
        &self,
        account_id: AccountId,
        amount: i64,
    ) -> Result<entries::Model, QueryError> {
        let entry = entries::ActiveModel {
            account_id: Set(account_id.into_inner()),
            amount: Set(amount),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(entry.insert(self.conn).await?)
    }

    /// Fetches an entry by ID.
    pub async fn get_entry(&self, id: EntryId) -> Result<entries::Model, QueryError> {
        entries::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await?
            .ok_or(QueryError::NotFound {
                entity: "Entry",
                id: id.into_inner(),
            })
    }

    /// Lists one account's entries ordered by ID ascending.
    pub async fn list_entries(
        &self,
        account_id: AccountId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<entries::Model>, QueryError> {
        Ok(entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(entries::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.conn)
            .await?)
    }
}
