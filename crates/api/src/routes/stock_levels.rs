//! Stock level routes. Levels are derived from the inventory ledger.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tally_core::inventory::{StockFilter, StockLevel};
use tally_shared::types::{ItemId, WarehouseId};

use crate::{ApiResult, AppState};

/// Creates the stock level routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock-levels", get(list_levels))
        .route("/stock-levels/{item_id}/{warehouse_id}", get(get_level))
        .route("/stock-cache/verify", get(verify_cache))
        .route("/stock-cache/reconcile", post(reconcile_cache))
}

/// GET `/stock-levels` - Levels per (item, warehouse), optionally filtered.
async fn list_levels(
    State(state): State<AppState>,
    Query(filter): Query<StockFilter>,
) -> ApiResult<impl IntoResponse> {
    let levels = state.stock().get_levels(filter).await?;
    Ok(Json(json!({ "levels": levels })))
}

/// GET `/stock-levels/{item_id}/{warehouse_id}` - On-hand quantity of one pair.
async fn get_level(
    State(state): State<AppState>,
    Path((item_id, warehouse_id)): Path<(ItemId, WarehouseId)>,
) -> ApiResult<impl IntoResponse> {
    let quantity = state.stock().get_level(item_id, warehouse_id).await?;
    Ok(Json(StockLevel {
        item_id,
        warehouse_id,
        quantity,
    }))
}

/// GET `/stock-cache/verify` - Compare cached levels with the ledger.
async fn verify_cache(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.stock().verify_cache().await?))
}

/// POST `/stock-cache/reconcile` - Overwrite drifted cache entries.
async fn reconcile_cache(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.stock().reconcile_cache().await?))
}
