//! Inventory transaction routes.
//!
//! The ledger is append-only: there is no update or delete, mistakes are
//! corrected with `/{id}/reverse`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tally_core::inventory::{AdjustmentInput, RecordTransactionInput, TransactionType, TransferInput};
use tally_db::repositories::TransactionFilter;
use tally_shared::types::{InventoryTransactionId, ItemId, WarehouseId};
use uuid::Uuid;

use super::PageQuery;
use crate::extractors::AppJson;
use crate::{ApiResult, AppState};

/// Creates the inventory transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/inventory-transactions",
            get(list_transactions).post(record_transaction),
        )
        .route("/inventory-transactions/adjustments", post(record_adjustment))
        .route("/inventory-transactions/transfers", post(record_transfer))
        .route("/inventory-transactions/{transaction_id}", get(get_transaction))
        .route(
            "/inventory-transactions/{transaction_id}/reverse",
            post(reverse_transaction),
        )
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by item.
    pub item_id: Option<ItemId>,
    /// Filter by warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Filter by type.
    pub transaction_type: Option<TransactionType>,
    /// Filter by reference id (transfer pair or reversed row).
    pub reference_id: Option<Uuid>,
    /// Lower bound on transaction date (RFC 3339).
    pub date_from: Option<DateTime<Utc>>,
    /// Upper bound on transaction date (RFC 3339).
    pub date_to: Option<DateTime<Utc>>,
    /// Page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for reversing a transaction.
#[derive(Debug, Default, Deserialize)]
pub struct ReverseRequest {
    /// Note stored on the counter rows.
    pub notes: Option<String>,
}

/// GET `/inventory-transactions` - List movements in ledger order.
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .to_request();
    let filter = TransactionFilter {
        item_id: query.item_id,
        warehouse_id: query.warehouse_id,
        transaction_type: query.transaction_type,
        reference_id: query.reference_id,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    Ok(Json(state.inventory().list_transactions(filter, page).await?))
}

/// POST `/inventory-transactions` - Record one movement.
async fn record_transaction(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RecordTransactionInput>,
) -> ApiResult<impl IntoResponse> {
    let transaction = state.inventory().record_transaction(payload).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// POST `/inventory-transactions/adjustments` - Record a manual adjustment.
async fn record_adjustment(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdjustmentInput>,
) -> ApiResult<impl IntoResponse> {
    let transaction = state.inventory().record_adjustment(payload).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// POST `/inventory-transactions/transfers` - Move stock between warehouses.
async fn record_transfer(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TransferInput>,
) -> ApiResult<impl IntoResponse> {
    let transactions = state.inventory().record_transfer(payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "transactions": transactions }))))
}

/// GET `/inventory-transactions/{transaction_id}` - Get one movement.
async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<InventoryTransactionId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.inventory().get_transaction(transaction_id).await?))
}

/// POST `/inventory-transactions/{transaction_id}/reverse` - Append counter-transactions.
async fn reverse_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<InventoryTransactionId>,
    AppJson(payload): AppJson<ReverseRequest>,
) -> ApiResult<impl IntoResponse> {
    let transactions = state
        .inventory()
        .reverse_transaction(transaction_id, payload.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "transactions": transactions }))))
}
