//! Stock level repository: read-only aggregation over the inventory ledger.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tally_core::LedgerResult;
use tally_core::inventory::{
    ReconcileReport, StockFilter, StockKey, StockLevel, StockLevelCache, aggregate_levels, fold_level,
};
use tally_shared::types::{ItemId, WarehouseId};
use tracing::{debug, warn};

use super::db_err;
use super::inventory::{movement, normalize};
use crate::entities::inventory_transactions;

/// Derives stock levels from the transaction history.
///
/// Each query reads every relevant row in a single statement, so an
/// atomically inserted transfer pair is seen entirely or not at all.
#[derive(Clone)]
pub struct StockRepository {
    db: DatabaseConnection,
    cache: Option<StockLevelCache>,
}

impl StockRepository {
    /// Creates a stock repository without a cache.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    /// Serves point queries through `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: StockLevelCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// On-hand quantity of an item at a warehouse. Zero when there is no
    /// history; negative levels are reported as they are.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_level(&self, item_id: ItemId, warehouse_id: WarehouseId) -> LedgerResult<Decimal> {
        let key = StockKey::new(item_id, warehouse_id);
        let mut generation = None;
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&key) {
                debug!(item_id = %item_id, warehouse_id = %warehouse_id, "Stock level cache hit");
                return Ok(cached);
            }
            generation = Some(cache.generation(&key));
        }

        let rows = inventory_transactions::Entity::find()
            .filter(inventory_transactions::Column::ItemId.eq(item_id.into_inner()))
            .filter(inventory_transactions::Column::WarehouseId.eq(warehouse_id.into_inner()))
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let movements: Vec<_> = rows.into_iter().map(|r| movement(&normalize(r))).collect();
        let level = fold_level(&movements);

        if let (Some(cache), Some(generation)) = (&self.cache, generation)
            && !cache.insert_if_current(key, level, generation)
        {
            debug!(item_id = %item_id, warehouse_id = %warehouse_id, "Stock level written during read, not cached");
        }
        Ok(level)
    }

    /// One level per (item, warehouse) pair present in the ledger, zero-net
    /// pairs included, ordered by key. Always computed from the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_levels(&self, filter: StockFilter) -> LedgerResult<Vec<StockLevel>> {
        let mut query = inventory_transactions::Entity::find();
        if let Some(item_id) = filter.item_id {
            query = query.filter(inventory_transactions::Column::ItemId.eq(item_id.into_inner()));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(inventory_transactions::Column::WarehouseId.eq(warehouse_id.into_inner()));
        }

        let rows = query.all(&self.db).await.map_err(db_err)?;
        let movements: Vec<_> = rows.into_iter().map(|r| movement(&normalize(r))).collect();
        Ok(aggregate_levels(&movements))
    }

    /// Compares every cached level with the ledger. Repairs nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn verify_cache(&self) -> LedgerResult<ReconcileReport> {
        let Some(cache) = &self.cache else {
            return Ok(ReconcileReport::default());
        };
        let truth = self.get_levels(StockFilter::default()).await?;
        Ok(cache.verify(&truth))
    }

    /// Recomputes levels from the ledger and overwrites divergent cache
    /// entries with the derived value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reconcile_cache(&self) -> LedgerResult<ReconcileReport> {
        let Some(cache) = &self.cache else {
            return Ok(ReconcileReport::default());
        };
        let truth = self.get_levels(StockFilter::default()).await?;
        let report = cache.reconcile(&truth);
        if !report.is_consistent() {
            warn!(
                checked = report.checked,
                divergent = report.divergent.len(),
                "Stock level cache drifted from ledger, repaired"
            );
        }
        Ok(report)
    }
}
