//! Domain types for journal entry creation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, Money};

/// Unvalidated line as supplied by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineInput {
    /// Account to post against.
    pub account_id: AccountId,
    /// Amount, must be strictly positive.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// True for a debit line, false for a credit line.
    pub is_debit: bool,
    /// Optional line memo.
    pub memo: Option<String>,
}

impl LineInput {
    /// Debit line without memo.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal, currency: &str) -> Self {
        Self {
            account_id,
            amount,
            currency: currency.to_string(),
            is_debit: true,
            memo: None,
        }
    }

    /// Credit line without memo.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal, currency: &str) -> Self {
        Self {
            account_id,
            amount,
            currency: currency.to_string(),
            is_debit: false,
            memo: None,
        }
    }
}

/// Validated journal line.
///
/// The amount is never negative; the effect comes from `is_debit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// 1-based position within the entry.
    pub line_no: u32,
    /// Account posted against.
    pub account_id: AccountId,
    /// Amount and currency.
    pub amount: Money,
    /// True for a debit line.
    pub is_debit: bool,
    /// Optional line memo.
    pub memo: Option<String>,
}

/// Header fields of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Accounting date of the entry.
    pub entry_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// External reference (invoice number, ...).
    pub reference: Option<String>,
}
