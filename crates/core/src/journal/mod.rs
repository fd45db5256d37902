//! Double-entry journal engine.
//!
//! This module implements:
//! - Journal entry states and transitions (DRAFT -> POSTED -> VOIDED)
//! - The per-currency balance invariant
//! - Line validation against the chart of accounts
//! - Account balance folding over posted lines

pub mod balance;
pub mod entry;
pub mod service;
pub mod status;
pub mod types;

#[cfg(test)]
mod service_props;

pub use balance::{AccountBalance, CurrencyTotals, account_balances, ensure_balanced, totals_by_currency};
pub use entry::{DraftEntry, JournalEntry, MIN_LINES, PostedEntry, VoidedEntry};
pub use service::{AMOUNT_SCALE, JournalService};
pub use status::EntryStatus;
pub use types::{EntryHeader, JournalLine, LineInput};
