//! API route definitions.

use axum::Router;
use serde::Deserialize;
use tally_shared::types::PageRequest;

use crate::AppState;

pub mod accounts;
pub mod health;
pub mod inventory_transactions;
pub mod items;
pub mod journal_entries;
pub mod stock_levels;
pub mod warehouses;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(items::routes())
        .merge(warehouses::routes())
        .merge(journal_entries::routes())
        .merge(inventory_transactions::routes())
        .merge(stock_levels::routes())
}

/// Query parameters for `DELETE` on registry records and drafts.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    /// Remove the row instead of soft-deleting it.
    #[serde(default)]
    pub purge: bool,
}

/// Page parameters accepted by list endpoints.
///
/// Kept as plain fields because flattened numbers do not survive query
/// string decoding.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed, default: 1).
    pub page: Option<u32>,
    /// Items per page (default: 20, max: 100).
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// Converts to a normalized [`PageRequest`].
    #[must_use]
    pub fn to_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }
}
