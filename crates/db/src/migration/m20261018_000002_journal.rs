//! Journal entries and their lines.
//!
//! Lines cascade with their entry (only drafts are ever hard-deleted) and
//! restrict deletion of the accounts they reference.

use sea_orm_migration::prelude::*;

use super::m20261018_000001_registries::{Accounts, decimal, timestamp};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalEntries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntries::Description).text().not_null())
                    .col(ColumnDef::new(JournalEntries::Reference).string_len(100))
                    .col(
                        ColumnDef::new(JournalEntries::Status)
                            .string_len(10)
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(ColumnDef::new(JournalEntries::Version).integer().not_null().default(1))
                    .col(ColumnDef::new(JournalEntries::PostedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(JournalEntries::VoidedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(JournalEntries::VoidReason).text())
                    .col(ColumnDef::new(JournalEntries::DeletedAt).timestamp_with_time_zone())
                    .col(timestamp(JournalEntries::CreatedAt))
                    .col(timestamp(JournalEntries::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entries_status_date")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::Status)
                    .col(JournalEntries::EntryDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalLines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalLines::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JournalLines::EntryId).uuid().not_null())
                    .col(ColumnDef::new(JournalLines::LineNo).integer().not_null())
                    .col(ColumnDef::new(JournalLines::AccountId).uuid().not_null())
                    .col(
                        decimal(manager, JournalLines::Amount, 4)
                            .not_null()
                            .check(Expr::col(JournalLines::Amount).gt(0)),
                    )
                    .col(ColumnDef::new(JournalLines::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(JournalLines::IsDebit).boolean().not_null())
                    .col(ColumnDef::new(JournalLines::Memo).text())
                    .col(timestamp(JournalLines::CreatedAt))
                    .col(timestamp(JournalLines::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_lines_entry")
                            .from(JournalLines::Table, JournalLines::EntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_lines_account")
                            .from(JournalLines::Table, JournalLines::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_lines_entry")
                    .table(JournalLines::Table)
                    .col(JournalLines::EntryId)
                    .col(JournalLines::LineNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_lines_account")
                    .table(JournalLines::Table)
                    .col(JournalLines::AccountId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JournalLines::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum JournalEntries {
    Table,
    Id,
    EntryDate,
    Description,
    Reference,
    Status,
    Version,
    PostedAt,
    VoidedAt,
    VoidReason,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JournalLines {
    Table,
    Id,
    EntryId,
    LineNo,
    AccountId,
    Amount,
    Currency,
    IsDebit,
    Memo,
    CreatedAt,
    UpdatedAt,
}
