//! Chart of accounts routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tally_core::registry::AccountType;
use tally_db::repositories::{AccountFilter, CreateAccountInput, UpdateAccountInput};
use tally_shared::types::AccountId;

use super::DeleteQuery;
use crate::extractors::{AppJson, double_option};
use crate::{ApiResult, AppState};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/{account_id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/accounts/{account_id}/deactivate", post(deactivate_account))
        .route("/accounts/{account_id}/balances", get(get_account_balances))
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Filter by account type.
    pub account_type: Option<AccountType>,
    /// Filter by active status.
    pub is_active: Option<bool>,
    /// Only direct children of this account.
    pub parent_id: Option<AccountId>,
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account code (unique).
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account description.
    pub description: Option<String>,
    /// ASSET, LIABILITY, EQUITY, REVENUE or EXPENSE.
    pub account_type: AccountType,
    /// Parent account for hierarchical grouping.
    pub parent_id: Option<AccountId>,
    /// Whether the account is active (default: true).
    pub is_active: Option<bool>,
}

/// Request body for updating an account. `null` clears optional fields.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New description.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New type (only while no journal lines reference the account).
    pub account_type: Option<AccountType>,
    /// New parent.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<AccountId>>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// GET `/accounts` - List accounts ordered by code.
async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = AccountFilter {
        account_type: query.account_type,
        is_active: query.is_active,
        parent_id: query.parent_id.map(Some),
    };
    let accounts = state.accounts().list_accounts(filter).await?;
    Ok(Json(json!({ "accounts": accounts })))
}

/// POST `/accounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = state
        .accounts()
        .create_account(CreateAccountInput {
            code: payload.code,
            name: payload.name,
            description: payload.description,
            account_type: payload.account_type,
            parent_id: payload.parent_id,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET `/accounts/{account_id}` - Get account detail.
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.accounts().get_account(account_id).await?))
}

/// PATCH `/accounts/{account_id}` - Update an account.
async fn update_account(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
    AppJson(payload): AppJson<UpdateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = state
        .accounts()
        .update_account(
            account_id,
            UpdateAccountInput {
                code: payload.code,
                name: payload.name,
                description: payload.description,
                account_type: payload.account_type,
                parent_id: payload.parent_id,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(account))
}

/// POST `/accounts/{account_id}/deactivate` - Block new lines on the account.
async fn deactivate_account(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.accounts().deactivate_account(account_id).await?))
}

/// DELETE `/accounts/{account_id}` - Soft-delete, or purge with `?purge=true`.
async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let repo = state.accounts();
    if query.purge {
        repo.purge_account(account_id).await?;
    } else {
        repo.delete_account(account_id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/accounts/{account_id}/balances` - Posted balance per currency.
async fn get_account_balances(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
) -> ApiResult<impl IntoResponse> {
    let balances = state.accounts().account_balances(account_id).await?;
    Ok(Json(json!({ "balances": balances })))
}
