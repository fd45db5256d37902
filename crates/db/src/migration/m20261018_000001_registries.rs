//! Reference registries: chart of accounts, items and warehouses.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Code).string_len(50).not_null().unique_key())
                    .col(ColumnDef::new(Accounts::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Accounts::Description).text())
                    .col(ColumnDef::new(Accounts::AccountType).string_len(20).not_null())
                    .col(ColumnDef::new(Accounts::ParentId).uuid())
                    .col(ColumnDef::new(Accounts::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Accounts::DeletedAt).timestamp_with_time_zone())
                    .col(timestamp(Accounts::CreatedAt))
                    .col(timestamp(Accounts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accounts_parent")
                            .from(Accounts::Table, Accounts::ParentId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_parent")
                    .table(Accounts::Table)
                    .col(Accounts::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Items::Sku).string_len(50).not_null().unique_key())
                    .col(ColumnDef::new(Items::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Items::Description).text())
                    .col(ColumnDef::new(Items::UnitOfMeasure).string_len(50).not_null())
                    .col(ColumnDef::new(Items::ItemType).string_len(20).not_null())
                    .col(decimal(manager, Items::PurchasePrice, 4))
                    .col(decimal(manager, Items::SalesPrice, 4))
                    .col(ColumnDef::new(Items::ValuationMethod).string_len(20))
                    .col(ColumnDef::new(Items::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Items::DeletedAt).timestamp_with_time_zone())
                    .col(timestamp(Items::CreatedAt))
                    .col(timestamp(Items::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Warehouses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Warehouses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Warehouses::Code).string_len(50).not_null().unique_key())
                    .col(ColumnDef::new(Warehouses::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Warehouses::Location).text())
                    .col(ColumnDef::new(Warehouses::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Warehouses::DeletedAt).timestamp_with_time_zone())
                    .col(timestamp(Warehouses::CreatedAt))
                    .col(timestamp(Warehouses::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Warehouses::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).if_exists().to_owned())
            .await
    }
}

/// Non-null timestamp column defaulting to the current time.
/// Fixed-point column, `NUMERIC(19, scale)`. SQLite caps the declared
/// precision at 16 digits.
pub(super) fn decimal<T: IntoIden>(manager: &SchemaManager, name: T, scale: u32) -> ColumnDef {
    let precision = match manager.get_database_backend() {
        DbBackend::Sqlite => 16,
        _ => 19,
    };
    ColumnDef::new(name).decimal_len(precision, scale).to_owned()
}

pub(super) fn timestamp<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveIden)]
pub(super) enum Accounts {
    Table,
    Id,
    Code,
    Name,
    Description,
    AccountType,
    ParentId,
    IsActive,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Items {
    Table,
    Id,
    Sku,
    Name,
    Description,
    UnitOfMeasure,
    ItemType,
    PurchasePrice,
    SalesPrice,
    ValuationMethod,
    IsActive,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Warehouses {
    Table,
    Id,
    Code,
    Name,
    Location,
    IsActive,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
