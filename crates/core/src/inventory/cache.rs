//! Stock level caching using Moka.
//!
//! The cache is a read-through accelerator over the transaction history.
//! It is never a source of truth: any entry can be dropped at any time and
//! recomputed from the ledger, and [`StockLevelCache::reconcile`] repairs
//! entries that drifted.
//!
//! Read-through fills are guarded by per-key generations: a reader takes a
//! [`generation`](StockLevelCache::generation) before folding the ledger and
//! stores its result with [`insert_if_current`](StockLevelCache::insert_if_current),
//! which refuses the value when a write invalidated the key in between.

use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::sync::Cache;
use rust_decimal::Decimal;
use serde::Serialize;

use super::stock::{StockKey, StockLevel};

/// Default cache capacity (number of item/warehouse pairs).
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default time-to-live for cache entries (5 minutes).
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Number of generation counters keys are spread over. Keys sharing a
/// stripe only cost each other a skipped fill, never a stale one.
const GENERATION_STRIPES: usize = 64;

/// A cached level that disagrees with the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Divergence {
    /// Affected pair.
    pub key: StockKey,
    /// Value held by the cache.
    pub cached: Decimal,
    /// Value derived from the ledger.
    pub actual: Decimal,
}

/// Outcome of [`StockLevelCache::verify`] or [`StockLevelCache::reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Number of cached entries compared.
    pub checked: u64,
    /// Entries whose cached value differed from the ledger.
    pub divergent: Vec<Divergence>,
}

impl ReconcileReport {
    /// True when every cached entry matched.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.divergent.is_empty()
    }
}

/// Cache of derived stock levels keyed by (item, warehouse).
///
/// Cloning shares the underlying store.
#[derive(Clone)]
pub struct StockLevelCache {
    cache: Cache<StockKey, Decimal>,
    generations: Arc<[Mutex<u64>]>,
    hasher: RandomState,
}

impl StockLevelCache {
    /// Creates a cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            generations: (0..GENERATION_STRIPES).map(|_| Mutex::new(0)).collect(),
            hasher: RandomState::new(),
        }
    }

    fn stripe(&self, key: &StockKey) -> MutexGuard<'_, u64> {
        let len = self.generations.len() as u64;
        #[allow(clippy::cast_possible_truncation)]
        let idx = (self.hasher.hash_one(key) % len) as usize;
        self.generations[idx].lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached level for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &StockKey) -> Option<Decimal> {
        self.cache.get(key)
    }

    /// Stores a level computed from the ledger.
    pub fn insert(&self, key: StockKey, quantity: Decimal) {
        self.cache.insert(key, quantity);
    }

    /// Current write generation of `key`. Take it before reading the ledger.
    #[must_use]
    pub fn generation(&self, key: &StockKey) -> u64 {
        *self.stripe(key)
    }

    /// Stores `quantity` only if `key` has not been invalidated since
    /// `generation` was taken. Returns whether the value was stored.
    pub fn insert_if_current(&self, key: StockKey, quantity: Decimal, generation: u64) -> bool {
        let current = self.stripe(&key);
        if *current != generation {
            return false;
        }
        self.cache.insert(key, quantity);
        true
    }

    /// Drops the entry for `key` and advances its generation. Called after
    /// every committed movement.
    pub fn invalidate(&self, key: &StockKey) {
        let mut generation = self.stripe(key);
        *generation = generation.wrapping_add(1);
        self.cache.invalidate(key);
    }

    /// Drops every entry and advances every generation.
    pub fn invalidate_all(&self) {
        let mut guards: Vec<_> = self
            .generations
            .iter()
            .map(|g| g.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();
        for generation in &mut guards {
            **generation = generation.wrapping_add(1);
        }
        self.cache.invalidate_all();
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending maintenance so counts and evictions are up to date.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }

    /// Compares every cached entry with the ledger-derived `truth`.
    ///
    /// Pairs absent from `truth` have no history and therefore a level of
    /// zero.
    #[must_use]
    pub fn verify(&self, truth: &[StockLevel]) -> ReconcileReport {
        let actual: HashMap<StockKey, Decimal> = truth.iter().map(|l| (l.key(), l.quantity)).collect();

        let mut report = ReconcileReport::default();
        for (key, cached) in &self.cache {
            report.checked += 1;
            let expected = actual.get(&*key).copied().unwrap_or_default();
            if cached != expected {
                report.divergent.push(Divergence {
                    key: *key,
                    cached,
                    actual: expected,
                });
            }
        }
        report.divergent.sort_by_key(|d| d.key);
        report
    }

    /// Like [`verify`](Self::verify), then overwrites every divergent entry
    /// with the ledger value.
    #[must_use]
    pub fn reconcile(&self, truth: &[StockLevel]) -> ReconcileReport {
        let report = self.verify(truth);
        for divergence in &report.divergent {
            self.cache.insert(divergence.key, divergence.actual);
        }
        report
    }
}

impl Default for StockLevelCache {
    fn default() -> Self {
        Self::new()
    }
}
