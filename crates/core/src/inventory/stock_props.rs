//! Property-based tests for stock aggregation.
//!
//! - A level equals the signed sum of its key's movements
//! - Aggregated levels agree with per-key folds
//! - A movement followed by its counter leaves the level unchanged
//! - Reconciliation leaves the cache consistent with the ledger

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{ItemId, WarehouseId};

use super::cache::StockLevelCache;
use super::stock::{StockKey, StockMovement, aggregate_levels, fold_level};
use super::types::TransactionType;

/// Strategy to generate valid quantities (0.001 to 1,000.000).
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|milli| Decimal::new(milli, 3))
}

fn transaction_type() -> impl Strategy<Value = TransactionType> {
    prop::sample::select(TransactionType::ALL.to_vec())
}

/// Movements spread over a small fixed set of keys so that keys collide.
fn movements() -> impl Strategy<Value = Vec<StockMovement>> {
    let keys: Vec<StockKey> = (0..3)
        .map(|_| StockKey::new(ItemId::new(), WarehouseId::new()))
        .collect();
    prop::collection::vec((prop::sample::select(keys), transaction_type(), quantity()), 0..40).prop_map(|rows| {
        rows.into_iter()
            .map(|(key, transaction_type, quantity)| StockMovement {
                key,
                transaction_type,
                quantity,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every aggregated level is the fold of exactly its own key's rows.
    #[test]
    fn prop_aggregate_matches_fold(movements in movements()) {
        let levels = aggregate_levels(&movements);
        for level in &levels {
            let own: Vec<StockMovement> = movements.iter().copied().filter(|m| m.key == level.key()).collect();
            prop_assert_eq!(level.quantity, fold_level(&own));
        }

        let total: Decimal = levels.iter().map(|l| l.quantity).sum();
        prop_assert_eq!(total, fold_level(&movements));
    }

    /// Appending a counter movement restores the previous level.
    #[test]
    fn prop_counter_movement_cancels(
        movements in movements(),
        transaction_type in transaction_type(),
        quantity in quantity(),
    ) {
        let key = StockKey::new(ItemId::new(), WarehouseId::new());
        let before = fold_level(&movements);

        let mut extended = movements;
        extended.push(StockMovement { key, transaction_type, quantity });
        extended.push(StockMovement { key, transaction_type: transaction_type.counter(), quantity });

        prop_assert_eq!(fold_level(&extended), before);
    }

    /// Whatever the cache holds, one reconcile pass makes it agree with
    /// the levels derived from the movements.
    #[test]
    fn prop_reconcile_repairs_any_drift(
        movements in movements(),
        drift in prop::collection::vec(-1_000i64..1_000i64, 0..5),
    ) {
        let truth = aggregate_levels(&movements);
        let cache = StockLevelCache::new();
        for level in &truth {
            cache.insert(level.key(), level.quantity);
        }
        for (level, offset) in truth.iter().zip(&drift) {
            cache.insert(level.key(), level.quantity + Decimal::from(*offset));
        }
        let stranger = StockKey::new(ItemId::new(), WarehouseId::new());
        cache.insert(stranger, Decimal::ONE);

        let report = cache.reconcile(&truth);
        prop_assert!(report.divergent.iter().any(|d| d.key == stranger));
        prop_assert!(cache.verify(&truth).is_consistent());
        for level in &truth {
            prop_assert_eq!(cache.get(&level.key()), Some(level.quantity));
        }
        prop_assert_eq!(cache.get(&stranger), Some(Decimal::ZERO));
    }
}
