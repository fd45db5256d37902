//! Inventory service: validation of movements before they are appended.

use chrono::{DateTime, Utc};
use tally_shared::types::{InventoryTransactionId, ItemId, WarehouseId};
use uuid::Uuid;

use super::stock::StockMovement;
use super::types::{
    AdjustmentInput, NewInventoryTransaction, Quantity, RecordTransactionInput, TransactionType, TransferInput,
};
use crate::error::{EntityKind, LedgerError, LedgerResult, Unusable};
use crate::registry::{ItemInfo, WarehouseInfo};

/// Stateless inventory service.
pub struct InventoryService;

impl InventoryService {
    /// Validates a movement against the item and warehouse registries.
    ///
    /// The item must exist, be active, not deleted and carry stock; the
    /// warehouse must exist, be active and not deleted. Checked at time of
    /// use, so deactivating a registry record immediately blocks new rows.
    pub fn validate_record<I, W>(
        input: RecordTransactionInput,
        now: DateTime<Utc>,
        item_lookup: I,
        warehouse_lookup: W,
    ) -> LedgerResult<NewInventoryTransaction>
    where
        I: Fn(ItemId) -> Option<ItemInfo>,
        W: Fn(WarehouseId) -> Option<WarehouseInfo>,
    {
        let quantity = Quantity::new(input.quantity)?;
        Self::ensure_item(input.item_id, &item_lookup)?;
        Self::ensure_warehouse(input.warehouse_id, &warehouse_lookup)?;

        Ok(NewInventoryTransaction {
            item_id: input.item_id,
            warehouse_id: input.warehouse_id,
            quantity,
            transaction_type: input.transaction_type,
            reference_id: input.reference_id,
            transaction_date: input.transaction_date.unwrap_or(now),
            notes: normalize_notes(input.notes),
        })
    }

    /// Maps a manual adjustment onto a plain movement.
    #[must_use]
    pub fn adjustment(input: AdjustmentInput) -> RecordTransactionInput {
        RecordTransactionInput {
            item_id: input.item_id,
            warehouse_id: input.warehouse_id,
            quantity: input.quantity,
            transaction_type: input.direction.transaction_type(),
            reference_id: None,
            transaction_date: None,
            notes: input.notes,
        }
    }

    /// Builds the TRANSFER_OUT / TRANSFER_IN pair sharing `reference_id`.
    ///
    /// Both legs carry the same quantity and date, so the pair nets to zero
    /// for the item across warehouses.
    pub fn transfer<I, W>(
        input: TransferInput,
        reference_id: Uuid,
        now: DateTime<Utc>,
        item_lookup: I,
        warehouse_lookup: W,
    ) -> LedgerResult<[NewInventoryTransaction; 2]>
    where
        I: Fn(ItemId) -> Option<ItemInfo>,
        W: Fn(WarehouseId) -> Option<WarehouseInfo>,
    {
        if input.from_warehouse_id == input.to_warehouse_id {
            return Err(LedgerError::SameWarehouseTransfer(
                input.from_warehouse_id.into_inner(),
            ));
        }

        let leg = |warehouse_id, transaction_type| RecordTransactionInput {
            item_id: input.item_id,
            warehouse_id,
            quantity: input.quantity,
            transaction_type,
            reference_id: Some(reference_id),
            transaction_date: input.transaction_date,
            notes: input.notes.clone(),
        };

        let out = Self::validate_record(
            leg(input.from_warehouse_id, TransactionType::TransferOut),
            now,
            &item_lookup,
            &warehouse_lookup,
        )?;
        let inbound = Self::validate_record(
            leg(input.to_warehouse_id, TransactionType::TransferIn),
            now,
            &item_lookup,
            &warehouse_lookup,
        )?;
        Ok([out, inbound])
    }

    /// Builds the counter-transaction that cancels `original`.
    ///
    /// Same item, warehouse and quantity; opposite type; `reference_id`
    /// points at the original row. Registry activity is not re-checked: a
    /// correction must stay possible after an item or warehouse is retired.
    pub fn counter_transaction(
        original_id: InventoryTransactionId,
        original: &StockMovement,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> LedgerResult<NewInventoryTransaction> {
        let quantity = Quantity::new(original.quantity)
            .map_err(|e| LedgerError::Internal(format!("stored quantity is invalid: {e}")))?;
        let notes = normalize_notes(notes).or_else(|| Some(format!("Reversal of {original_id}")));

        Ok(NewInventoryTransaction {
            item_id: original.key.item_id,
            warehouse_id: original.key.warehouse_id,
            quantity,
            transaction_type: original.transaction_type.counter(),
            reference_id: Some(original_id.into_inner()),
            transaction_date: now,
            notes,
        })
    }

    fn ensure_item<I>(id: ItemId, lookup: &I) -> LedgerResult<()>
    where
        I: Fn(ItemId) -> Option<ItemInfo>,
    {
        match lookup(id) {
            Some(item) => item.ensure_stockable(),
            None => Err(LedgerError::UnusableReference {
                kind: EntityKind::Item,
                id: id.into_inner(),
                reason: Unusable::Missing,
            }),
        }
    }

    fn ensure_warehouse<W>(id: WarehouseId, lookup: &W) -> LedgerResult<()>
    where
        W: Fn(WarehouseId) -> Option<WarehouseInfo>,
    {
        match lookup(id) {
            Some(warehouse) => warehouse.ensure_usable(),
            None => Err(LedgerError::UnusableReference {
                kind: EntityKind::Warehouse,
                id: id.into_inner(),
                reason: Unusable::Missing,
            }),
        }
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
