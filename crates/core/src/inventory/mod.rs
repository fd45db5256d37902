//! Inventory ledger.
//!
//! Stock is tracked as an append-only list of signed movements per
//! (item, warehouse). Levels are always derived from that history; the
//! optional [`StockLevelCache`] only accelerates reads.

pub mod cache;
pub mod service;
pub mod stock;
pub mod types;

#[cfg(test)]
mod stock_props;

pub use cache::{Divergence, ReconcileReport, StockLevelCache};
pub use service::InventoryService;
pub use stock::{StockFilter, StockKey, StockLevel, StockMovement, aggregate_levels, fold_level};
pub use types::{
    AdjustmentDirection, AdjustmentInput, NewInventoryTransaction, QUANTITY_SCALE, Quantity, RecordTransactionInput,
    TransactionType, TransferInput,
};
