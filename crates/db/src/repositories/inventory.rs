//! Inventory repository: the append-only stock movement ledger.
//!
//! Rows are only ever inserted. Corrections append a counter-transaction.
//! After every committed write the affected stock level cache keys are
//! invalidated.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::inventory::{
    AdjustmentInput, InventoryService, NewInventoryTransaction, QUANTITY_SCALE, RecordTransactionInput, StockKey,
    StockLevelCache, StockMovement, TransactionType, TransferInput,
};
use tally_core::registry::{ItemInfo, WarehouseInfo};
use tally_core::{EntityKind, LedgerError, LedgerResult};
use tally_shared::types::{InventoryTransactionId, ItemId, PageRequest, PageResponse, WarehouseId};
use tracing::info;
use uuid::Uuid;

use super::db_err;
use super::item::item_info;
use super::warehouse::warehouse_info;
use crate::entities::{inventory_transactions, items, sea_orm_active_enums, warehouses};

/// Filter options for listing inventory transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    /// Only this item.
    pub item_id: Option<ItemId>,
    /// Only this warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Only this type.
    pub transaction_type: Option<TransactionType>,
    /// Only rows carrying this reference id.
    pub reference_id: Option<Uuid>,
    /// Transaction date lower bound (inclusive).
    pub date_from: Option<DateTime<Utc>>,
    /// Transaction date upper bound (inclusive).
    pub date_to: Option<DateTime<Utc>>,
}

/// Projection of a stored row used for aggregation and reversal.
#[must_use]
pub fn movement(model: &inventory_transactions::Model) -> StockMovement {
    StockMovement {
        key: StockKey::new(model.item_id.into(), model.warehouse_id.into()),
        transaction_type: model.transaction_type.into(),
        quantity: model.quantity,
    }
}

/// Inventory repository for recording and reading stock movements.
#[derive(Clone)]
pub struct InventoryRepository {
    db: DatabaseConnection,
    cache: Option<StockLevelCache>,
}

impl InventoryRepository {
    /// Creates a new inventory repository without a level cache.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    /// Attaches the level cache to invalidate after writes.
    #[must_use]
    pub fn with_cache(mut self, cache: StockLevelCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Appends one movement.
    ///
    /// # Errors
    ///
    /// - `NonPositiveQuantity` / `QuantityPrecision` for a bad quantity
    /// - `UnusableReference` if the item or warehouse is unknown, inactive
    ///   or deleted
    /// - `NonInventoryItem` if the item does not carry stock
    pub async fn record_transaction(
        &self,
        input: RecordTransactionInput,
    ) -> LedgerResult<inventory_transactions::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let item = load_item(&txn, input.item_id).await?;
        let warehouse = load_warehouse(&txn, input.warehouse_id).await?;
        let new = InventoryService::validate_record(input, Utc::now(), |_| item, |_| warehouse)?;

        let stored = insert(&txn, new).await?;
        txn.commit().await.map_err(db_err)?;

        self.invalidate(&[&stored]);
        info!(
            transaction_id = %stored.id,
            item_id = %stored.item_id,
            warehouse_id = %stored.warehouse_id,
            transaction_type = ?stored.transaction_type,
            quantity = %stored.quantity,
            "Inventory transaction recorded"
        );
        Ok(stored)
    }

    /// Records a manual adjustment (IN -> `ADJUST_STOCK_IN`, OUT -> `ADJUST_STOCK_OUT`).
    ///
    /// # Errors
    ///
    /// Same as [`Self::record_transaction`].
    pub async fn record_adjustment(&self, input: AdjustmentInput) -> LedgerResult<inventory_transactions::Model> {
        self.record_transaction(InventoryService::adjustment(input)).await
    }

    /// Moves stock between warehouses: inserts the `TRANSFER_OUT` /
    /// `TRANSFER_IN` pair atomically under a shared generated reference id.
    ///
    /// # Errors
    ///
    /// `SameWarehouseTransfer`, plus the validation errors of
    /// [`Self::record_transaction`] for either leg.
    pub async fn record_transfer(&self, input: TransferInput) -> LedgerResult<[inventory_transactions::Model; 2]> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let (from_id, to_id) = (input.from_warehouse_id, input.to_warehouse_id);
        let item = load_item(&txn, input.item_id).await?;
        let from = load_warehouse(&txn, from_id).await?;
        let to = load_warehouse(&txn, to_id).await?;

        let reference_id = Uuid::now_v7();
        let [out, inbound] = InventoryService::transfer(
            input,
            reference_id,
            Utc::now(),
            |_| item,
            |id| if id == from_id { from } else if id == to_id { to } else { None },
        )?;

        let out = insert(&txn, out).await?;
        let inbound = insert(&txn, inbound).await?;
        txn.commit().await.map_err(db_err)?;

        self.invalidate(&[&out, &inbound]);
        info!(
            reference_id = %reference_id,
            item_id = %out.item_id,
            from_warehouse_id = %out.warehouse_id,
            to_warehouse_id = %inbound.warehouse_id,
            quantity = %out.quantity,
            "Stock transferred"
        );
        Ok([out, inbound])
    }

    /// Appends the counter-transaction of `id`.
    ///
    /// A transfer leg is reversed together with its partner leg, so the
    /// pair stays balanced. The counter row's `reference_id` points at the
    /// row it cancels.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the transaction does not exist
    /// - `AlreadyReversed` if a counter-transaction already exists
    pub async fn reverse_transaction(
        &self,
        id: InventoryTransactionId,
        notes: Option<String>,
    ) -> LedgerResult<Vec<inventory_transactions::Model>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let original = find(&txn, id).await?;
        let mut targets = vec![original.clone()];

        let original_type = TransactionType::from(original.transaction_type);
        if original_type.is_transfer()
            && let Some(reference_id) = original.reference_id
        {
            let partner = inventory_transactions::Entity::find()
                .filter(inventory_transactions::Column::ReferenceId.eq(reference_id))
                .filter(inventory_transactions::Column::Id.ne(original.id))
                .filter(inventory_transactions::Column::ItemId.eq(original.item_id))
                .filter(
                    inventory_transactions::Column::TransactionType
                        .eq(sea_orm_active_enums::TransactionType::from(original_type.counter())),
                )
                .one(&txn)
                .await
                .map_err(db_err)?;
            targets.extend(partner.map(normalize));
        }

        let now = Utc::now();
        let mut stored = Vec::with_capacity(targets.len());
        for target in &targets {
            ensure_not_reversed(&txn, target).await?;
            let counter =
                InventoryService::counter_transaction(target.id.into(), &movement(target), notes.clone(), now)?;
            stored.push(insert(&txn, counter).await?);
        }
        txn.commit().await.map_err(db_err)?;

        self.invalidate(&stored.iter().collect::<Vec<_>>());
        info!(transaction_id = %id, counters = stored.len(), "Inventory transaction reversed");
        Ok(stored)
    }

    /// Finds a transaction by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if it does not exist.
    pub async fn get_transaction(&self, id: InventoryTransactionId) -> LedgerResult<inventory_transactions::Model> {
        find(&self.db, id).await
    }

    /// Lists transactions in ledger order (transaction date, then id).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<inventory_transactions::Model>> {
        let mut query = inventory_transactions::Entity::find();

        if let Some(item_id) = filter.item_id {
            query = query.filter(inventory_transactions::Column::ItemId.eq(item_id.into_inner()));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(inventory_transactions::Column::WarehouseId.eq(warehouse_id.into_inner()));
        }
        if let Some(transaction_type) = filter.transaction_type {
            query = query.filter(
                inventory_transactions::Column::TransactionType
                    .eq(sea_orm_active_enums::TransactionType::from(transaction_type)),
            );
        }
        if let Some(reference_id) = filter.reference_id {
            query = query.filter(inventory_transactions::Column::ReferenceId.eq(reference_id));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(inventory_transactions::Column::TransactionDate.gte(from.fixed_offset()));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(inventory_transactions::Column::TransactionDate.lte(to.fixed_offset()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_asc(inventory_transactions::Column::TransactionDate)
            .order_by_asc(inventory_transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(
            rows.into_iter().map(normalize).collect(),
            page,
            total,
        ))
    }

    fn invalidate(&self, rows: &[&inventory_transactions::Model]) {
        if let Some(cache) = &self.cache {
            for row in rows {
                cache.invalidate(&movement(row).key);
            }
        }
    }
}

/// Loads an item for validation, deleted rows included so the error can
/// say why it is unusable.
async fn load_item<C: ConnectionTrait>(conn: &C, id: ItemId) -> LedgerResult<Option<ItemInfo>> {
    let item = items::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(db_err)?;
    Ok(item.as_ref().map(item_info))
}

async fn load_warehouse<C: ConnectionTrait>(conn: &C, id: WarehouseId) -> LedgerResult<Option<WarehouseInfo>> {
    let warehouse = warehouses::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(db_err)?;
    Ok(warehouse.as_ref().map(warehouse_info))
}

async fn find<C: ConnectionTrait>(
    conn: &C,
    id: InventoryTransactionId,
) -> LedgerResult<inventory_transactions::Model> {
    inventory_transactions::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(db_err)?
        .map(normalize)
        .ok_or_else(|| LedgerError::not_found(EntityKind::InventoryTransaction, id))
}

async fn ensure_not_reversed<C: ConnectionTrait>(conn: &C, target: &inventory_transactions::Model) -> LedgerResult<()> {
    let counter_type = TransactionType::from(target.transaction_type).counter();
    let existing = inventory_transactions::Entity::find()
        .filter(inventory_transactions::Column::ReferenceId.eq(target.id))
        .filter(
            inventory_transactions::Column::TransactionType.eq(sea_orm_active_enums::TransactionType::from(counter_type)),
        )
        .select_only()
        .column(inventory_transactions::Column::Id)
        .into_tuple::<Uuid>()
        .one(conn)
        .await
        .map_err(db_err)?;

    match existing {
        Some(_) => Err(LedgerError::AlreadyReversed(target.id)),
        None => Ok(()),
    }
}

async fn insert<C: ConnectionTrait>(
    conn: &C,
    new: NewInventoryTransaction,
) -> LedgerResult<inventory_transactions::Model> {
    let model = inventory_transactions::ActiveModel {
        id: Set(InventoryTransactionId::new().into_inner()),
        item_id: Set(new.item_id.into_inner()),
        warehouse_id: Set(new.warehouse_id.into_inner()),
        quantity: Set(new.quantity.value()),
        transaction_type: Set(new.transaction_type.into()),
        reference_id: Set(new.reference_id),
        transaction_date: Set(new.transaction_date.fixed_offset()),
        notes: Set(new.notes),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(db_err)?;
    Ok(normalize(model))
}

/// Quantities come back from SQLite as floats; pin them to the column scale.
pub(crate) fn normalize(mut model: inventory_transactions::Model) -> inventory_transactions::Model {
    model.quantity = model.quantity.round_dp(QUANTITY_SCALE).normalize();
    model
}
