//! Inventory item routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tally_core::registry::{ItemType, ValuationMethod};
use tally_db::repositories::{CreateItemInput, ItemFilter, UpdateItemInput};
use tally_shared::types::ItemId;

use super::DeleteQuery;
use crate::extractors::{AppJson, double_option};
use crate::{ApiResult, AppState};

/// Creates the item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{item_id}", get(get_item).patch(update_item).delete(delete_item))
        .route("/items/{item_id}/deactivate", post(deactivate_item))
}

/// Query parameters for listing items.
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    /// Filter by item type.
    pub item_type: Option<ItemType>,
    /// Filter by active status.
    pub is_active: Option<bool>,
}

/// Request body for creating an item.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    /// Stock keeping unit (unique).
    pub sku: String,
    /// Item name.
    pub name: String,
    /// Item description.
    pub description: Option<String>,
    /// Unit of measure, e.g. `PCS` or `KG`.
    pub unit_of_measure: String,
    /// RAW_MATERIAL, FINISHED_GOOD, WIP or NON_INVENTORY.
    pub item_type: ItemType,
    /// Standard purchase price.
    pub purchase_price: Option<Decimal>,
    /// Standard sales price.
    pub sales_price: Option<Decimal>,
    /// Valuation method tag.
    pub valuation_method: Option<ValuationMethod>,
    /// Whether the item is active (default: true).
    pub is_active: Option<bool>,
}

/// Request body for updating an item. `null` clears optional fields.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// New SKU.
    pub sku: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New description.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New unit of measure.
    pub unit_of_measure: Option<String>,
    /// New item type.
    pub item_type: Option<ItemType>,
    /// New purchase price.
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_price: Option<Option<Decimal>>,
    /// New sales price.
    #[serde(default, deserialize_with = "double_option")]
    pub sales_price: Option<Option<Decimal>>,
    /// New valuation method.
    #[serde(default, deserialize_with = "double_option")]
    pub valuation_method: Option<Option<ValuationMethod>>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// GET `/items` - List items ordered by SKU.
async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = ItemFilter {
        item_type: query.item_type,
        is_active: query.is_active,
    };
    let items = state.items().list_items(filter).await?;
    Ok(Json(json!({ "items": items })))
}

/// POST `/items` - Create an item.
async fn create_item(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateItemRequest>,
) -> ApiResult<impl IntoResponse> {
    let item = state
        .items()
        .create_item(CreateItemInput {
            sku: payload.sku,
            name: payload.name,
            description: payload.description,
            unit_of_measure: payload.unit_of_measure,
            item_type: payload.item_type,
            purchase_price: payload.purchase_price,
            sales_price: payload.sales_price,
            valuation_method: payload.valuation_method,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET `/items/{item_id}` - Get item detail.
async fn get_item(State(state): State<AppState>, Path(item_id): Path<ItemId>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.items().get_item(item_id).await?))
}

/// PATCH `/items/{item_id}` - Update an item.
async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
    AppJson(payload): AppJson<UpdateItemRequest>,
) -> ApiResult<impl IntoResponse> {
    let item = state
        .items()
        .update_item(
            item_id,
            UpdateItemInput {
                sku: payload.sku,
                name: payload.name,
                description: payload.description,
                unit_of_measure: payload.unit_of_measure,
                item_type: payload.item_type,
                purchase_price: payload.purchase_price,
                sales_price: payload.sales_price,
                valuation_method: payload.valuation_method,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(item))
}

/// POST `/items/{item_id}/deactivate` - Block new movements of the item.
async fn deactivate_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.items().deactivate_item(item_id).await?))
}

/// DELETE `/items/{item_id}` - Soft-delete, or purge with `?purge=true`.
async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let repo = state.items();
    if query.purge {
        repo.purge_item(item_id).await?;
    } else {
        repo.delete_item(item_id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
