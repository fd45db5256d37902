//! Warehouse routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tally_db::repositories::{CreateWarehouseInput, UpdateWarehouseInput, WarehouseFilter};
use tally_shared::types::WarehouseId;

use super::DeleteQuery;
use crate::extractors::{AppJson, double_option};
use crate::{ApiResult, AppState};

/// Creates the warehouse routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
        .route(
            "/warehouses/{warehouse_id}",
            get(get_warehouse).patch(update_warehouse).delete(delete_warehouse),
        )
        .route("/warehouses/{warehouse_id}/deactivate", post(deactivate_warehouse))
}

/// Query parameters for listing warehouses.
#[derive(Debug, Deserialize)]
pub struct ListWarehousesQuery {
    /// Filter by active status.
    pub is_active: Option<bool>,
}

/// Request body for creating a warehouse.
#[derive(Debug, Deserialize)]
pub struct CreateWarehouseRequest {
    /// Warehouse code (unique).
    pub code: String,
    /// Warehouse name.
    pub name: String,
    /// Free-form location.
    pub location: Option<String>,
    /// Whether the warehouse is active (default: true).
    pub is_active: Option<bool>,
}

/// Request body for updating a warehouse. `null` clears the location.
#[derive(Debug, Deserialize)]
pub struct UpdateWarehouseRequest {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New location.
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// GET `/warehouses` - List warehouses ordered by code.
async fn list_warehouses(
    State(state): State<AppState>,
    Query(query): Query<ListWarehousesQuery>,
) -> ApiResult<impl IntoResponse> {
    let warehouses = state
        .warehouses()
        .list_warehouses(WarehouseFilter {
            is_active: query.is_active,
        })
        .await?;
    Ok(Json(json!({ "warehouses": warehouses })))
}

/// POST `/warehouses` - Create a warehouse.
async fn create_warehouse(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateWarehouseRequest>,
) -> ApiResult<impl IntoResponse> {
    let warehouse = state
        .warehouses()
        .create_warehouse(CreateWarehouseInput {
            code: payload.code,
            name: payload.name,
            location: payload.location,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

/// GET `/warehouses/{warehouse_id}` - Get warehouse detail.
async fn get_warehouse(
    State(state): State<AppState>,
    Path(warehouse_id): Path<WarehouseId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.warehouses().get_warehouse(warehouse_id).await?))
}

/// PATCH `/warehouses/{warehouse_id}` - Update a warehouse.
async fn update_warehouse(
    State(state): State<AppState>,
    Path(warehouse_id): Path<WarehouseId>,
    AppJson(payload): AppJson<UpdateWarehouseRequest>,
) -> ApiResult<impl IntoResponse> {
    let warehouse = state
        .warehouses()
        .update_warehouse(
            warehouse_id,
            UpdateWarehouseInput {
                code: payload.code,
                name: payload.name,
                location: payload.location,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(warehouse))
}

/// POST `/warehouses/{warehouse_id}/deactivate` - Block new movements into the warehouse.
async fn deactivate_warehouse(
    State(state): State<AppState>,
    Path(warehouse_id): Path<WarehouseId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.warehouses().deactivate_warehouse(warehouse_id).await?))
}

/// DELETE `/warehouses/{warehouse_id}` - Soft-delete, or purge with `?purge=true`.
async fn delete_warehouse(
    State(state): State<AppState>,
    Path(warehouse_id): Path<WarehouseId>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let repo = state.warehouses();
    if query.purge {
        repo.purge_warehouse(warehouse_id).await?;
    } else {
        repo.delete_warehouse(warehouse_id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
