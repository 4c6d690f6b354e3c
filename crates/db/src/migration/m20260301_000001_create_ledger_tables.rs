//! Initial ledger schema.
//!
//! Creates `accounts`, `entries` and `transfers`. Entries and transfers
//! reference accounts with `ON DELETE RESTRICT`, so an account cannot disappear
//! while its audit trail exists.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // ACCOUNTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Owner).string().not_null())
                    .col(ColumnDef::new(Accounts::Balance).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::Currency).string_len(3).not_null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One account per owner and currency.
        manager
            .create_index(
                Index::create()
                    .name("accounts_owner_currency_key")
                    .table(Accounts::Table)
                    .col(Accounts::Owner)
                    .col(Accounts::Currency)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // ENTRIES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Entries::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Entries::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Entries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entries_account")
                            .from(Entries::Table, Entries::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entries_account")
                    .table(Entries::Table)
                    .col(Entries::AccountId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // TRANSFERS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Transfers::FromAccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transfers::ToAccountId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transfers::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transfers::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Transfers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transfers_from_account")
                            .from(Transfers::Table, Transfers::FromAccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transfers_to_account")
                            .from(Transfers::Table, Transfers::ToAccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_from_account")
                    .table(Transfers::Table)
                    .col(Transfers::FromAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_to_account")
                    .table(Transfers::Table)
                    .col(Transfers::ToAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_from_to")
                    .table(Transfers::Table)
                    .col(Transfers::FromAccountId)
                    .col(Transfers::ToAccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transfers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entries::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Owner,
    Balance,
    Currency,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Entries {
    Table,
    Id,
    AccountId,
    Amount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Transfers {
    Table,
    Id,
    FromAccountId,
    ToAccountId,
    Amount,
    CreatedAt,
}
