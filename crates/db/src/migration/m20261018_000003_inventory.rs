//! Append-only inventory transaction ledger.

use sea_orm_migration::prelude::*;

use super::m20261018_000001_registries::{Items, Warehouses, decimal, timestamp};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InventoryTransactions::ItemId).uuid().not_null())
                    .col(ColumnDef::new(InventoryTransactions::WarehouseId).uuid().not_null())
                    .col(
                        decimal(manager, InventoryTransactions::Quantity, 3)
                            .not_null()
                            .check(Expr::col(InventoryTransactions::Quantity).gt(0)),
                    )
                    .col(
                        ColumnDef::new(InventoryTransactions::TransactionType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryTransactions::ReferenceId).uuid())
                    .col(
                        ColumnDef::new(InventoryTransactions::TransactionDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryTransactions::Notes).text())
                    .col(timestamp(InventoryTransactions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_transactions_item")
                            .from(InventoryTransactions::Table, InventoryTransactions::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_transactions_warehouse")
                            .from(InventoryTransactions::Table, InventoryTransactions::WarehouseId)
                            .to(Warehouses::Table, Warehouses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Level queries scan by (item, warehouse).
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_transactions_stock")
                    .table(InventoryTransactions::Table)
                    .col(InventoryTransactions::ItemId)
                    .col(InventoryTransactions::WarehouseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_transactions_reference")
                    .table(InventoryTransactions::Table)
                    .col(InventoryTransactions::ReferenceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(InventoryTransactions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum InventoryTransactions {
    Table,
    Id,
    ItemId,
    WarehouseId,
    Quantity,
    TransactionType,
    ReferenceId,
    TransactionDate,
    Notes,
    CreatedAt,
}
