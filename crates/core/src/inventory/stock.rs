//! Stock level derivation.
//!
//! On-hand quantity is never stored as a counter. It is folded from the
//! immutable transaction history: `level(i, w) = Σ sign(type) × quantity`
//! over all rows for item `i` at warehouse `w`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{ItemId, WarehouseId};

use super::types::TransactionType;

/// (item, warehouse) pair a level is reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    /// The item.
    pub item_id: ItemId,
    /// The warehouse.
    pub warehouse_id: WarehouseId,
}

impl StockKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(item_id: ItemId, warehouse_id: WarehouseId) -> Self {
        Self {
            item_id,
            warehouse_id,
        }
    }
}

/// The minimal projection of a ledger row needed for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    /// Item and warehouse.
    pub key: StockKey,
    /// Movement type.
    pub transaction_type: TransactionType,
    /// Positive quantity.
    pub quantity: Decimal,
}

impl StockMovement {
    /// Signed effect of this movement on its key's level.
    #[must_use]
    pub fn effect(&self) -> Decimal {
        self.transaction_type.signed(self.quantity)
    }
}

/// On-hand quantity of one item at one warehouse. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// The item.
    pub item_id: ItemId,
    /// The warehouse.
    pub warehouse_id: WarehouseId,
    /// Net quantity.
    pub quantity: Decimal,
}

impl StockLevel {
    /// Key of this level.
    #[must_use]
    pub const fn key(&self) -> StockKey {
        StockKey::new(self.item_id, self.warehouse_id)
    }
}

/// Optional item / warehouse restriction for level queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockFilter {
    /// Only this item.
    pub item_id: Option<ItemId>,
    /// Only this warehouse.
    pub warehouse_id: Option<WarehouseId>,
}

impl StockFilter {
    /// True if `key` satisfies the filter.
    #[must_use]
    pub fn matches(&self, key: &StockKey) -> bool {
        self.item_id.is_none_or(|id| id == key.item_id)
            && self.warehouse_id.is_none_or(|id| id == key.warehouse_id)
    }
}

/// Folds the movements of a single key into its level. Zero when empty.
#[must_use]
pub fn fold_level<'a, I>(movements: I) -> Decimal
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    movements
        .into_iter()
        .map(StockMovement::effect)
        .sum()
}

/// Folds movements into one level per key present, ordered by key.
///
/// Keys whose movements net to zero are still reported.
#[must_use]
pub fn aggregate_levels<'a, I>(movements: I) -> Vec<StockLevel>
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    let mut levels: BTreeMap<StockKey, Decimal> = BTreeMap::new();
    for movement in movements {
        *levels.entry(movement.key).or_default() += movement.effect();
    }

    levels
        .into_iter()
        .map(|(key, quantity)| StockLevel {
            item_id: key.item_id,
            warehouse_id: key.warehouse_id,
            quantity,
        })
        .collect()
}
