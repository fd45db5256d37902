//! Journal entry routes: drafting, posting and voiding.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::journal::{EntryHeader, EntryStatus, LineInput};
use tally_db::repositories::{CreateEntryInput, EntryFilter, UpdateEntryInput};
use tally_shared::types::{AccountId, JournalEntryId};

use super::{DeleteQuery, PageQuery};
use crate::extractors::AppJson;
use crate::{ApiResult, AppState};

/// Creates the journal entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journal-entries", get(list_entries).post(create_entry))
        .route(
            "/journal-entries/{entry_id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/journal-entries/{entry_id}/post", post(post_entry))
        .route("/journal-entries/{entry_id}/void", post(void_entry))
}

/// Query parameters for listing entries.
#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    /// Filter by status.
    pub status: Option<EntryStatus>,
    /// Entry date lower bound (inclusive, YYYY-MM-DD).
    pub date_from: Option<NaiveDate>,
    /// Entry date upper bound (inclusive, YYYY-MM-DD).
    pub date_to: Option<NaiveDate>,
    /// Exact external reference.
    pub reference: Option<String>,
    /// Only entries touching this account.
    pub account_id: Option<AccountId>,
    /// Page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating or replacing a draft.
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Description.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Lines in order.
    pub lines: Vec<LineInput>,
    /// Version the client last read (PUT only).
    pub expected_version: Option<i32>,
}

impl EntryRequest {
    fn header(&self) -> EntryHeader {
        EntryHeader {
            entry_date: self.entry_date,
            description: self.description.clone(),
            reference: self.reference.clone(),
        }
    }
}

/// Query parameters for posting.
#[derive(Debug, Deserialize)]
pub struct PostQuery {
    /// Fail with a concurrency error unless the entry still has this version.
    pub expected_version: Option<i32>,
}

/// Request body for voiding.
#[derive(Debug, Default, Deserialize)]
pub struct VoidRequest {
    /// Why the entry is voided.
    pub reason: Option<String>,
}

/// GET `/journal-entries` - List entries, newest first.
async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListEntriesQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .to_request();
    let filter = EntryFilter {
        status: query.status,
        date_from: query.date_from,
        date_to: query.date_to,
        reference: query.reference,
        account_id: query.account_id,
    };
    Ok(Json(state.journal().list_entries(filter, page).await?))
}

/// POST `/journal-entries` - Create a DRAFT entry.
async fn create_entry(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EntryRequest>,
) -> ApiResult<impl IntoResponse> {
    let entry = state
        .journal()
        .create_draft(CreateEntryInput {
            header: payload.header(),
            lines: payload.lines,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET `/journal-entries/{entry_id}` - Get an entry with its lines.
async fn get_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<JournalEntryId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.journal().get_entry(entry_id).await?))
}

/// PUT `/journal-entries/{entry_id}` - Replace the header and lines of a DRAFT.
async fn update_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<JournalEntryId>,
    AppJson(payload): AppJson<EntryRequest>,
) -> ApiResult<impl IntoResponse> {
    let header = payload.header();
    let entry = state
        .journal()
        .update_draft(
            entry_id,
            UpdateEntryInput {
                header: Some(header),
                lines: payload.lines,
                expected_version: payload.expected_version,
            },
        )
        .await?;
    Ok(Json(entry))
}

/// POST `/journal-entries/{entry_id}/post` - DRAFT -> POSTED.
async fn post_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<JournalEntryId>,
    Query(query): Query<PostQuery>,
) -> ApiResult<impl IntoResponse> {
    let entry = state
        .journal()
        .post_entry_checked(entry_id, query.expected_version)
        .await?;
    Ok(Json(entry))
}

/// POST `/journal-entries/{entry_id}/void` - POSTED -> VOIDED.
async fn void_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<JournalEntryId>,
    AppJson(payload): AppJson<VoidRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.journal().void_entry(entry_id, payload.reason).await?))
}

/// DELETE `/journal-entries/{entry_id}` - Soft-delete a DRAFT, or purge with `?purge=true`.
async fn delete_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<JournalEntryId>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let repo = state.journal();
    if query.purge {
        repo.purge_draft_entry(entry_id).await?;
    } else {
        repo.delete_draft_entry(entry_id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
