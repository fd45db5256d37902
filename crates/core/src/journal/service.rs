//! Journal service for entry validation and lifecycle transitions.
//!
//! This module provides the core business logic applied to journal entries
//! before they are persisted. Storage is abstracted behind lookup closures,
//! so the same rules run against any backend.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CurrencyCode, JournalEntryId, Money};

use super::entry::{DraftEntry, JournalEntry, MIN_LINES, PostedEntry, VoidedEntry};
use super::status::EntryStatus;
use super::types::{EntryHeader, JournalLine, LineInput};
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::registry::{AccountInfo, ensure_usable};

/// Number of fractional digits a line amount may carry.
pub const AMOUNT_SCALE: u32 = 4;

/// Maximum length of an entry description.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Stateless journal service.
pub struct JournalService;

impl JournalService {
    /// Validates raw line inputs into journal lines.
    ///
    /// Checks, in order:
    /// 1. At least two lines
    /// 2. Each amount strictly positive with at most [`AMOUNT_SCALE`] decimals
    /// 3. Each currency a three-letter code
    /// 4. Each account exists, is active and not deleted
    ///
    /// Balance is NOT checked here; drafts may be unbalanced.
    pub fn validate_lines<A>(inputs: &[LineInput], account_lookup: A) -> LedgerResult<Vec<JournalLine>>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        if inputs.len() < MIN_LINES {
            return Err(LedgerError::InsufficientLines(inputs.len()));
        }

        inputs
            .iter()
            .enumerate()
            .map(|(idx, input)| {
                let line_no = idx + 1;
                if input.amount <= Decimal::ZERO {
                    return Err(LedgerError::NonPositiveAmount {
                        line: line_no,
                        amount: input.amount,
                    });
                }
                if input.amount.round_dp(AMOUNT_SCALE) != input.amount {
                    return Err(LedgerError::AmountPrecision {
                        line: line_no,
                        amount: input.amount,
                    });
                }

                let currency = CurrencyCode::parse(&input.currency)
                    .map_err(|_| LedgerError::InvalidCurrency(input.currency.clone()))?;

                ensure_usable(
                    EntityKind::Account,
                    input.account_id.into_inner(),
                    account_lookup(input.account_id).map(|a| a.availability),
                )?;

                Ok(JournalLine {
                    line_no: u32::try_from(line_no)
                        .map_err(|_| LedgerError::invalid_field("lines", "too many lines"))?,
                    account_id: input.account_id,
                    amount: Money::new(input.amount, currency),
                    is_debit: input.is_debit,
                    memo: input
                        .memo
                        .as_deref()
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string),
                })
            })
            .collect()
    }

    /// Normalizes header fields: trims text, drops an empty reference.
    pub fn validate_header(header: EntryHeader) -> LedgerResult<EntryHeader> {
        let description = header.description.trim().to_string();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(LedgerError::invalid_field(
                "description",
                format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
            ));
        }

        let reference = header
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(EntryHeader {
            entry_date: header.entry_date,
            description,
            reference,
        })
    }

    /// Builds a new draft. Balance is not required.
    pub fn create_draft<A>(
        id: JournalEntryId,
        header: EntryHeader,
        lines: &[LineInput],
        account_lookup: A,
    ) -> LedgerResult<DraftEntry>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        let header = Self::validate_header(header)?;
        let lines = Self::validate_lines(lines, account_lookup)?;
        Ok(DraftEntry::new(id, header, lines))
    }

    /// Replaces the line set (and optionally the header) of a draft.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the entry is POSTED or VOIDED, plus the line
    /// validation errors of [`Self::validate_lines`].
    pub fn update_draft<A>(
        entry: JournalEntry,
        header: Option<EntryHeader>,
        lines: &[LineInput],
        account_lookup: A,
    ) -> LedgerResult<DraftEntry>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        let draft = entry.into_draft("update")?;
        let header = match header {
            Some(header) => Self::validate_header(header)?,
            None => draft.header.clone(),
        };
        let lines = Self::validate_lines(lines, account_lookup)?;
        Ok(draft.revise(header, lines))
    }

    /// DRAFT -> POSTED.
    pub fn post<A>(entry: JournalEntry, account_lookup: A, now: DateTime<Utc>) -> LedgerResult<PostedEntry>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        entry.into_draft("post")?.post(account_lookup, now)
    }

    /// POSTED -> VOIDED.
    pub fn void(entry: JournalEntry, reason: Option<String>, now: DateTime<Utc>) -> LedgerResult<VoidedEntry> {
        let reason = reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        Ok(entry.into_posted("void")?.void(reason, now))
    }

    /// Guard for operations that only exist for drafts (delete, purge).
    pub fn ensure_draft(status: EntryStatus, action: &'static str) -> LedgerResult<()> {
        if status.is_editable() {
            Ok(())
        } else {
            Err(LedgerError::InvalidState { status, action })
        }
    }
}
