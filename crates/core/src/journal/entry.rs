//! Journal entry states.
//!
//! Each lifecycle state is its own type, so posting is only callable on a
//! [`DraftEntry`] and voiding only on a [`PostedEntry`]. [`JournalEntry`]
//! is the tagged union used when the state is only known at runtime
//! (e.g. after loading from storage).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId};

use super::balance::{CurrencyTotals, ensure_balanced};
use super::status::EntryStatus;
use super::types::{EntryHeader, JournalLine};
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::registry::{AccountInfo, ensure_usable};

/// Minimum number of lines in a journal entry.
pub const MIN_LINES: usize = 2;

/// An editable entry; balance is not required yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    /// Entry id.
    pub id: JournalEntryId,
    /// Header fields.
    pub header: EntryHeader,
    /// Ordered lines.
    pub lines: Vec<JournalLine>,
    /// Optimistic concurrency counter.
    pub version: i32,
}

/// A balanced, locked entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntry {
    /// Entry id.
    pub id: JournalEntryId,
    /// Header fields.
    pub header: EntryHeader,
    /// Ordered lines.
    pub lines: Vec<JournalLine>,
    /// Optimistic concurrency counter.
    pub version: i32,
    /// Per-currency totals at posting time.
    pub totals: Vec<CurrencyTotals>,
    /// When the entry was posted.
    pub posted_at: DateTime<Utc>,
}

/// A reversed entry, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidedEntry {
    /// Entry id.
    pub id: JournalEntryId,
    /// Header fields.
    pub header: EntryHeader,
    /// Ordered lines, untouched by voiding.
    pub lines: Vec<JournalLine>,
    /// Optimistic concurrency counter.
    pub version: i32,
    /// When the entry was posted.
    pub posted_at: DateTime<Utc>,
    /// When the entry was voided.
    pub voided_at: DateTime<Utc>,
    /// Optional reason given when voiding.
    pub void_reason: Option<String>,
}

impl DraftEntry {
    /// Creates a fresh draft at version 1.
    #[must_use]
    pub fn new(id: JournalEntryId, header: EntryHeader, lines: Vec<JournalLine>) -> Self {
        Self {
            id,
            header,
            lines,
            version: 1,
        }
    }

    /// Replaces header and lines, bumping the version.
    #[must_use]
    pub fn revise(self, header: EntryHeader, lines: Vec<JournalLine>) -> Self {
        Self {
            id: self.id,
            header,
            lines,
            version: self.version + 1,
        }
    }

    /// Posts the draft.
    ///
    /// Re-checks every referenced account at posting time (an account
    /// deactivated after the draft was created blocks posting), then
    /// enforces the per-currency balance invariant.
    ///
    /// # Errors
    ///
    /// - `InsufficientLines` if the draft has fewer than two lines
    /// - `UnusableReference` if an account is unknown, inactive or deleted
    /// - `UnbalancedEntry` if any currency group does not balance
    pub fn post<A>(self, account_lookup: A, posted_at: DateTime<Utc>) -> LedgerResult<PostedEntry>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        if self.lines.len() < MIN_LINES {
            return Err(LedgerError::InsufficientLines(self.lines.len()));
        }

        for line in &self.lines {
            ensure_usable(
                EntityKind::Account,
                line.account_id.into_inner(),
                account_lookup(line.account_id).map(|a| a.availability),
            )?;
        }

        let totals = ensure_balanced(&self.lines)?;

        Ok(PostedEntry {
            id: self.id,
            header: self.header,
            lines: self.lines,
            version: self.version + 1,
            totals,
            posted_at,
        })
    }
}

impl PostedEntry {
    /// Voids the entry. Lines are left untouched.
    #[must_use]
    pub fn void(self, reason: Option<String>, voided_at: DateTime<Utc>) -> VoidedEntry {
        VoidedEntry {
            id: self.id,
            header: self.header,
            lines: self.lines,
            version: self.version + 1,
            posted_at: self.posted_at,
            voided_at,
            void_reason: reason,
        }
    }
}

/// A journal entry in any state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalEntry {
    /// Editable entry.
    Draft(DraftEntry),
    /// Posted entry.
    Posted(PostedEntry),
    /// Voided entry.
    Voided(VoidedEntry),
}

impl JournalEntry {
    /// Current status.
    #[must_use]
    pub const fn status(&self) -> EntryStatus {
        match self {
            Self::Draft(_) => EntryStatus::Draft,
            Self::Posted(_) => EntryStatus::Posted,
            Self::Voided(_) => EntryStatus::Voided,
        }
    }

    /// Entry id.
    #[must_use]
    pub const fn id(&self) -> JournalEntryId {
        match self {
            Self::Draft(e) => e.id,
            Self::Posted(e) => e.id,
            Self::Voided(e) => e.id,
        }
    }

    /// Current version.
    #[must_use]
    pub const fn version(&self) -> i32 {
        match self {
            Self::Draft(e) => e.version,
            Self::Posted(e) => e.version,
            Self::Voided(e) => e.version,
        }
    }

    /// Header fields.
    #[must_use]
    pub const fn header(&self) -> &EntryHeader {
        match self {
            Self::Draft(e) => &e.header,
            Self::Posted(e) => &e.header,
            Self::Voided(e) => &e.header,
        }
    }

    /// Ordered lines.
    #[must_use]
    pub fn lines(&self) -> &[JournalLine] {
        match self {
            Self::Draft(e) => &e.lines,
            Self::Posted(e) => &e.lines,
            Self::Voided(e) => &e.lines,
        }
    }

    /// Unwraps a draft, or fails with `InvalidState` naming `action`.
    pub fn into_draft(self, action: &'static str) -> LedgerResult<DraftEntry> {
        match self {
            Self::Draft(draft) => Ok(draft),
            other => Err(LedgerError::InvalidState {
                status: other.status(),
                action,
            }),
        }
    }

    /// Unwraps a posted entry, or fails with `InvalidState` naming `action`.
    pub fn into_posted(self, action: &'static str) -> LedgerResult<PostedEntry> {
        match self {
            Self::Posted(posted) => Ok(posted),
            other => Err(LedgerError::InvalidState {
                status: other.status(),
                action,
            }),
        }
    }
}

impl From<DraftEntry> for JournalEntry {
    fn from(entry: DraftEntry) -> Self {
        Self::Draft(entry)
    }
}

impl From<PostedEntry> for JournalEntry {
    fn from(entry: PostedEntry) -> Self {
        Self::Posted(entry)
    }
}

impl From<VoidedEntry> for JournalEntry {
    fn from(entry: VoidedEntry) -> Self {
        Self::Voided(entry)
    }
}
