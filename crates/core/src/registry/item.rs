//! Inventory item catalog rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::ItemId;

use super::Availability;
use crate::error::{EntityKind, LedgerError, LedgerResult};

/// Item classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    /// Purchased input to production.
    RawMaterial,
    /// Sellable output.
    FinishedGood,
    /// Work in progress.
    Wip,
    /// Services and other items without stock.
    NonInventory,
}

impl ItemType {
    /// All item types.
    pub const ALL: [Self; 4] = [
        Self::RawMaterial,
        Self::FinishedGood,
        Self::Wip,
        Self::NonInventory,
    ];

    /// Stored/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RawMaterial => "RAW_MATERIAL",
            Self::FinishedGood => "FINISHED_GOOD",
            Self::Wip => "WIP",
            Self::NonInventory => "NON_INVENTORY",
        }
    }

    /// Whether stock movements may be recorded for this type.
    #[must_use]
    pub const fn carries_stock(self) -> bool {
        !matches!(self, Self::NonInventory)
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inventory valuation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValuationMethod {
    /// First in, first out.
    Fifo,
    /// Last in, first out.
    Lifo,
    /// Moving weighted average cost.
    WeightedAverage,
}

impl ValuationMethod {
    /// Stored/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fifo => "FIFO",
            Self::Lifo => "LIFO",
            Self::WeightedAverage => "WEIGHTED_AVERAGE",
        }
    }
}

/// Information about an item needed for validation.
#[derive(Debug, Clone, Copy)]
pub struct ItemInfo {
    /// The item ID.
    pub id: ItemId,
    /// The item type.
    pub item_type: ItemType,
    /// Active / deleted flags at the time of lookup.
    pub availability: Availability,
}

impl ItemInfo {
    /// Ensures stock movements can be recorded against this item.
    pub fn ensure_stockable(&self) -> LedgerResult<()> {
        self.availability.check(EntityKind::Item, self.id.into_inner())?;
        if !self.item_type.carries_stock() {
            return Err(LedgerError::NonInventoryItem(self.id.into_inner()));
        }
        Ok(())
    }
}

/// Prices are optional but never negative.
pub fn validate_prices(purchase_price: Option<Decimal>, sales_price: Option<Decimal>) -> LedgerResult<()> {
    for (field, price) in [("purchase_price", purchase_price), ("sales_price", sales_price)] {
        if price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(LedgerError::invalid_field(field, "must not be negative"));
        }
    }
    Ok(())
}
