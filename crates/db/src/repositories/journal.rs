//! Journal repository: persistence of journal entries and their lines.
//!
//! Lifecycle rules live in `tally_core::journal`; this module loads the
//! stored entry into its domain state, applies the transition there, and
//! writes the result back inside one database transaction. State changes
//! are claimed with a conditional UPDATE on `(id, version, status)`, so two
//! writers racing on the same entry cannot both succeed.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tally_core::journal::{
    AMOUNT_SCALE, DraftEntry, EntryHeader, EntryStatus, JournalEntry, JournalLine, JournalService, LineInput,
    PostedEntry, VoidedEntry, totals_by_currency,
};
use tally_core::{EntityKind, LedgerError, LedgerResult};
use tally_shared::types::{AccountId, CurrencyCode, JournalEntryId, JournalLineId, Money, PageRequest, PageResponse};
use tracing::{info, warn};
use uuid::Uuid;

use super::account::load_account_infos;
use super::db_err;
use crate::entities::{self, journal_entries, journal_lines, sea_orm_active_enums};

/// Input for creating a draft entry.
#[derive(Debug, Clone)]
pub struct CreateEntryInput {
    /// Header fields.
    pub header: EntryHeader,
    /// Line set; at least two lines, balance not required.
    pub lines: Vec<LineInput>,
}

/// Input for replacing the content of a draft entry.
#[derive(Debug, Clone)]
pub struct UpdateEntryInput {
    /// New header, or `None` to keep the current one.
    pub header: Option<EntryHeader>,
    /// Replacement line set.
    pub lines: Vec<LineInput>,
    /// Version the caller read; a mismatch is a concurrent modification.
    pub expected_version: Option<i32>,
}

/// Filter options for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Only entries in this status.
    pub status: Option<EntryStatus>,
    /// Entry date lower bound (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Entry date upper bound (inclusive).
    pub date_to: Option<NaiveDate>,
    /// Exact external reference.
    pub reference: Option<String>,
    /// Only entries with at least one line on this account.
    pub account_id: Option<AccountId>,
}

/// Entry header row with its ordered lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryWithLines {
    /// The entry header.
    #[serde(flatten)]
    pub entry: journal_entries::Model,
    /// Lines ordered by `line_no`.
    pub lines: Vec<journal_lines::Model>,
}

impl EntryWithLines {
    /// Rebuilds the typed lifecycle state from the stored rows.
    ///
    /// # Errors
    ///
    /// `Internal` if stored data violates a schema-level assumption
    /// (bad currency code, missing posting timestamp).
    pub fn to_domain(&self) -> LedgerResult<JournalEntry> {
        let id = JournalEntryId::from(self.entry.id);
        let header = EntryHeader {
            entry_date: self.entry.entry_date,
            description: self.entry.description.clone(),
            reference: self.entry.reference.clone(),
        };
        let lines = self.lines.iter().map(line_to_domain).collect::<LedgerResult<Vec<_>>>()?;
        let version = self.entry.version;

        let posted_at = || {
            self.entry
                .posted_at
                .map(|t| t.with_timezone(&Utc))
                .ok_or_else(|| LedgerError::Internal(format!("journal entry {id} has no posting time")))
        };

        Ok(match self.entry.status {
            sea_orm_active_enums::EntryStatus::Draft => DraftEntry {
                id,
                header,
                lines,
                version,
            }
            .into(),
            sea_orm_active_enums::EntryStatus::Posted => PostedEntry {
                id,
                header,
                totals: totals_by_currency(&lines),
                lines,
                version,
                posted_at: posted_at()?,
            }
            .into(),
            sea_orm_active_enums::EntryStatus::Voided => VoidedEntry {
                id,
                header,
                lines,
                version,
                posted_at: posted_at()?,
                voided_at: self
                    .entry
                    .voided_at
                    .map(|t| t.with_timezone(&Utc))
                    .ok_or_else(|| LedgerError::Internal(format!("journal entry {id} has no void time")))?,
                void_reason: self.entry.void_reason.clone(),
            }
            .into(),
        })
    }
}

fn line_to_domain(line: &journal_lines::Model) -> LedgerResult<JournalLine> {
    let currency = CurrencyCode::parse(&line.currency)
        .map_err(|e| LedgerError::Internal(format!("stored currency is invalid: {e}")))?;
    let line_no = u32::try_from(line.line_no)
        .map_err(|_| LedgerError::Internal(format!("stored line number {} is negative", line.line_no)))?;

    Ok(JournalLine {
        line_no,
        account_id: line.account_id.into(),
        amount: Money::new(line.amount, currency),
        is_debit: line.is_debit,
        memo: line.memo.clone(),
    })
}

/// Journal repository for entry lifecycle operations.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a DRAFT entry with its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Validation errors from [`JournalService::create_draft`]: fewer than two
    /// lines, non-positive amount, malformed currency, or an unknown,
    /// inactive or deleted account.
    pub async fn create_draft(&self, input: CreateEntryInput) -> LedgerResult<EntryWithLines> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let accounts = load_account_infos(&txn, input.lines.iter().map(|l| l.account_id)).await?;
        let draft = JournalService::create_draft(JournalEntryId::new(), input.header, &input.lines, |id| {
            accounts.get(&id).copied()
        })?;

        let entry = journal_entries::ActiveModel {
            id: Set(draft.id.into_inner()),
            entry_date: Set(draft.header.entry_date),
            description: Set(draft.header.description.clone()),
            reference: Set(draft.header.reference.clone()),
            status: Set(sea_orm_active_enums::EntryStatus::Draft),
            version: Set(draft.version),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let lines = insert_lines(&txn, draft.id, &draft.lines).await?;
        txn.commit().await.map_err(db_err)?;

        info!(entry_id = %entry.id, lines = lines.len(), "Journal entry drafted");
        Ok(normalize(EntryWithLines { entry, lines }))
    }

    /// Replaces the header and line set of a DRAFT entry.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the entry does not exist or is soft-deleted
    /// - `ConcurrentModification` if `expected_version` is stale or another
    ///   writer changed the entry in between
    /// - `InvalidState` if the entry is POSTED or VOIDED
    /// - line validation errors as for [`Self::create_draft`]
    pub async fn update_draft(&self, id: JournalEntryId, input: UpdateEntryInput) -> LedgerResult<EntryWithLines> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let current = load_entry(&txn, id, false).await?;
        check_version(id, current.entry.version, input.expected_version)?;
        let read_version = current.entry.version;

        let accounts = load_account_infos(&txn, input.lines.iter().map(|l| l.account_id)).await?;
        let revised = JournalService::update_draft(current.to_domain()?, input.header, &input.lines, |id| {
            accounts.get(&id).copied()
        })?;

        claim(
            &txn,
            id,
            read_version,
            EntryStatus::Draft,
            journal_entries::Entity::update_many()
                .col_expr(journal_entries::Column::EntryDate, Expr::value(revised.header.entry_date))
                .col_expr(
                    journal_entries::Column::Description,
                    Expr::value(revised.header.description.clone()),
                )
                .col_expr(
                    journal_entries::Column::Reference,
                    Expr::value(revised.header.reference.clone()),
                ),
        )
        .await?;

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::EntryId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        insert_lines(&txn, id, &revised.lines).await?;

        let updated = load_entry(&txn, id, false).await?;
        txn.commit().await.map_err(db_err)?;

        info!(entry_id = %id, version = updated.entry.version, "Journal draft updated");
        Ok(updated)
    }

    /// Posts a DRAFT entry. Equivalent to
    /// [`post_entry_checked`](Self::post_entry_checked) without a version.
    ///
    /// # Errors
    ///
    /// See [`Self::post_entry_checked`].
    pub async fn post_entry(&self, id: JournalEntryId) -> LedgerResult<EntryWithLines> {
        self.post_entry_checked(id, None).await
    }

    /// DRAFT -> POSTED.
    ///
    /// Re-validates every referenced account at posting time, then enforces
    /// the per-currency balance invariant. On any error the entry stays
    /// DRAFT and nothing is written.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the entry does not exist or is soft-deleted
    /// - `ConcurrentModification` if `expected_version` is stale, or another
    ///   writer posted or edited the entry between read and write
    /// - `InvalidState` if the entry is already POSTED or VOIDED
    /// - `UnusableReference` if an account is now inactive or deleted
    /// - `UnbalancedEntry` naming the first currency that does not balance
    pub async fn post_entry_checked(
        &self,
        id: JournalEntryId,
        expected_version: Option<i32>,
    ) -> LedgerResult<EntryWithLines> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let current = load_entry(&txn, id, false).await?;
        check_version(id, current.entry.version, expected_version)?;
        let read_version = current.entry.version;

        let accounts = load_account_infos(&txn, current.lines.iter().map(|l| AccountId::from(l.account_id))).await?;
        let posted = JournalService::post(current.to_domain()?, |id| accounts.get(&id).copied(), Utc::now())
            .inspect_err(|e| warn!(entry_id = %id, error = %e, "Journal entry rejected at posting"))?;

        claim(
            &txn,
            id,
            read_version,
            EntryStatus::Draft,
            journal_entries::Entity::update_many()
                .col_expr(
                    journal_entries::Column::Status,
                    Expr::value(sea_orm_active_enums::EntryStatus::Posted),
                )
                .col_expr(
                    journal_entries::Column::PostedAt,
                    Expr::value(posted.posted_at.fixed_offset()),
                ),
        )
        .await?;

        let updated = load_entry(&txn, id, false).await?;
        txn.commit().await.map_err(db_err)?;

        info!(
            entry_id = %id,
            status = %EntryStatus::Posted,
            currencies = posted.totals.len(),
            "Journal entry posted"
        );
        Ok(updated)
    }

    /// POSTED -> VOIDED. Lines are left untouched for audit.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the entry does not exist
    /// - `InvalidState` if the entry is DRAFT or already VOIDED
    /// - `ConcurrentModification` if another writer voided it in between
    pub async fn void_entry(&self, id: JournalEntryId, reason: Option<String>) -> LedgerResult<EntryWithLines> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let current = load_entry(&txn, id, false).await?;
        let read_version = current.entry.version;
        let voided = JournalService::void(current.to_domain()?, reason, Utc::now())?;

        claim(
            &txn,
            id,
            read_version,
            EntryStatus::Posted,
            journal_entries::Entity::update_many()
                .col_expr(
                    journal_entries::Column::Status,
                    Expr::value(sea_orm_active_enums::EntryStatus::Voided),
                )
                .col_expr(
                    journal_entries::Column::VoidedAt,
                    Expr::value(voided.voided_at.fixed_offset()),
                )
                .col_expr(journal_entries::Column::VoidReason, Expr::value(voided.void_reason.clone())),
        )
        .await?;

        let updated = load_entry(&txn, id, false).await?;
        txn.commit().await.map_err(db_err)?;

        info!(entry_id = %id, status = %EntryStatus::Voided, "Journal entry voided");
        Ok(updated)
    }

    /// Finds a visible entry with its lines.
    ///
    /// # Errors
    ///
    /// `NotFound` if the entry does not exist or is soft-deleted.
    pub async fn get_entry(&self, id: JournalEntryId) -> LedgerResult<EntryWithLines> {
        load_entry(&self.db, id, false).await
    }

    /// Lists visible entries, newest entry date first.
    ///
    /// Lines for the page are fetched with a single additional query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_entries(
        &self,
        filter: EntryFilter,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<EntryWithLines>> {
        let mut query = journal_entries::Entity::find().filter(journal_entries::Column::DeletedAt.is_null());

        if let Some(status) = filter.status {
            query = query.filter(journal_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::from(status)));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(journal_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(journal_entries::Column::EntryDate.lte(to));
        }
        if let Some(reference) = filter.reference {
            query = query.filter(journal_entries::Column::Reference.eq(reference));
        }
        if let Some(account_id) = filter.account_id {
            query = query.filter(
                journal_entries::Column::Id.in_subquery(
                    Query::select()
                        .column(journal_lines::Column::EntryId)
                        .from(journal_lines::Entity)
                        .and_where(journal_lines::Column::AccountId.eq(account_id.into_inner()))
                        .to_owned(),
                ),
            );
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let entries = query
            .order_by_desc(journal_entries::Column::EntryDate)
            .order_by_desc(journal_entries::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
        let mut lines_by_entry: HashMap<Uuid, Vec<journal_lines::Model>> = HashMap::new();
        for line in journal_lines::Entity::find()
            .filter(journal_lines::Column::EntryId.is_in(ids))
            .order_by_asc(journal_lines::Column::LineNo)
            .all(&self.db)
            .await
            .map_err(db_err)?
        {
            lines_by_entry.entry(line.entry_id).or_default().push(line);
        }

        let data = entries
            .into_iter()
            .map(|entry| {
                let lines = lines_by_entry.remove(&entry.id).unwrap_or_default();
                normalize(EntryWithLines { entry, lines })
            })
            .collect();

        Ok(PageResponse::new(data, page, total))
    }

    /// Soft-deletes an abandoned DRAFT. Rows are kept but become invisible.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidState` outside DRAFT, or `ConcurrentModification`.
    pub async fn delete_draft_entry(&self, id: JournalEntryId) -> LedgerResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let current = load_entry(&txn, id, false).await?;
        JournalService::ensure_draft(current.entry.status.into(), "delete")?;

        claim(
            &txn,
            id,
            current.entry.version,
            EntryStatus::Draft,
            journal_entries::Entity::update_many()
                .col_expr(journal_entries::Column::DeletedAt, Expr::value(Some(entities::now()))),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        info!(entry_id = %id, "Journal draft soft-deleted");
        Ok(())
    }

    /// Hard-deletes a DRAFT and its lines. Soft-deleted drafts can be purged.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidState` outside DRAFT, or `ConcurrentModification`.
    pub async fn purge_draft_entry(&self, id: JournalEntryId) -> LedgerResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let current = load_entry(&txn, id, true).await?;
        JournalService::ensure_draft(current.entry.status.into(), "purge")?;

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::EntryId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let result = journal_entries::Entity::delete_many()
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::Version.eq(current.entry.version))
            .filter(journal_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Draft))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::ConcurrentModification(id.into_inner()));
        }
        txn.commit().await.map_err(db_err)?;

        info!(entry_id = %id, "Journal draft purged");
        Ok(())
    }
}

fn check_version(id: JournalEntryId, current: i32, expected: Option<i32>) -> LedgerResult<()> {
    match expected {
        Some(expected) if expected != current => Err(LedgerError::ConcurrentModification(id.into_inner())),
        _ => Ok(()),
    }
}

/// Applies `update` only if the row still has the version and status that
/// were read. Bumps the version and `updated_at`.
async fn claim<C: ConnectionTrait>(
    conn: &C,
    id: JournalEntryId,
    read_version: i32,
    expected_status: EntryStatus,
    update: sea_orm::UpdateMany<journal_entries::Entity>,
) -> LedgerResult<()> {
    let result = update
        .col_expr(
            journal_entries::Column::Version,
            Expr::col(journal_entries::Column::Version).add(1),
        )
        .col_expr(journal_entries::Column::UpdatedAt, Expr::value(entities::now()))
        .filter(journal_entries::Column::Id.eq(id.into_inner()))
        .filter(journal_entries::Column::Version.eq(read_version))
        .filter(journal_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::from(expected_status)))
        .filter(journal_entries::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        warn!(entry_id = %id, read_version, "Journal entry changed concurrently");
        return Err(LedgerError::ConcurrentModification(id.into_inner()));
    }
    Ok(())
}

async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    entry_id: JournalEntryId,
    lines: &[JournalLine],
) -> LedgerResult<Vec<journal_lines::Model>> {
    let mut stored = Vec::with_capacity(lines.len());
    // One by one so that `ActiveModelBehavior` stamps the timestamps.
    for line in lines {
        let model = journal_lines::ActiveModel {
            id: Set(JournalLineId::new().into_inner()),
            entry_id: Set(entry_id.into_inner()),
            line_no: Set(i32::try_from(line.line_no)
                .map_err(|_| LedgerError::invalid_field("lines", "too many lines"))?),
            account_id: Set(line.account_id.into_inner()),
            amount: Set(line.amount.amount),
            currency: Set(line.amount.currency.as_str().to_string()),
            is_debit: Set(line.is_debit),
            memo: Set(line.memo.clone()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
        stored.push(model);
    }
    Ok(stored)
}

async fn load_entry<C: ConnectionTrait>(
    conn: &C,
    id: JournalEntryId,
    include_deleted: bool,
) -> LedgerResult<EntryWithLines> {
    let mut query = journal_entries::Entity::find_by_id(id.into_inner());
    if !include_deleted {
        query = query.filter(journal_entries::Column::DeletedAt.is_null());
    }
    let entry = query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| LedgerError::not_found(EntityKind::JournalEntry, id))?;

    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::EntryId.eq(entry.id))
        .order_by_asc(journal_lines::Column::LineNo)
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(normalize(EntryWithLines { entry, lines }))
}

/// Amounts come back from SQLite as floats; pin them to the column scale.
fn normalize(mut entry: EntryWithLines) -> EntryWithLines {
    for line in &mut entry.lines {
        line.amount = line.amount.round_dp(AMOUNT_SCALE);
    }
    entry
}
