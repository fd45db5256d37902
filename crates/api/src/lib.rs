//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - A JSON extractor that reports malformed bodies in the API error shape
//! - Mapping from ledger errors to HTTP responses

pub mod error;
pub mod extractors;
pub mod routes;

pub use error::{ApiError, ApiResult};

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tally_core::inventory::StockLevelCache;
use tally_db::{
    AccountRepository, InventoryRepository, ItemRepository, JournalRepository, StockRepository, WarehouseRepository,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Stock level cache shared by the inventory and stock repositories.
    pub stock_cache: Option<StockLevelCache>,
}

impl AppState {
    /// Creates the state from a connection pool and an optional cache.
    #[must_use]
    pub fn new(db: DatabaseConnection, stock_cache: Option<StockLevelCache>) -> Self {
        Self {
            db: Arc::new(db),
            stock_cache,
        }
    }

    pub(crate) fn accounts(&self) -> AccountRepository {
        AccountRepository::new((*self.db).clone())
    }

    pub(crate) fn items(&self) -> ItemRepository {
        ItemRepository::new((*self.db).clone())
    }

    pub(crate) fn warehouses(&self) -> WarehouseRepository {
        WarehouseRepository::new((*self.db).clone())
    }

    pub(crate) fn journal(&self) -> JournalRepository {
        JournalRepository::new((*self.db).clone())
    }

    pub(crate) fn inventory(&self) -> InventoryRepository {
        let repo = InventoryRepository::new((*self.db).clone());
        match &self.stock_cache {
            Some(cache) => repo.with_cache(cache.clone()),
            None => repo,
        }
    }

    pub(crate) fn stock(&self) -> StockRepository {
        let repo = StockRepository::new((*self.db).clone());
        match &self.stock_cache {
            Some(cache) => repo.with_cache(cache.clone()),
            None => repo,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
