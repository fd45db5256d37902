//! Property-based tests for JournalService.
//!
//! - Every posted entry is balanced per currency
//! - Any entry with a one-sided difference in some currency is rejected
//! - A posted entry can never be posted again

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, JournalEntryId};

use super::balance::totals_by_currency;
use super::service::JournalService;
use super::types::{EntryHeader, LineInput};
use crate::error::LedgerError;
use crate::registry::{AccountInfo, AccountType, Availability};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate currency codes.
fn currency_code() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("USD"), Just("EUR"), Just("IDR"), Just("JPY")]
}

/// Balanced line set: every debit is mirrored by a credit of the same currency.
fn balanced_lines() -> impl Strategy<Value = Vec<LineInput>> {
    prop::collection::vec((positive_amount(), currency_code()), 1..6).prop_map(|pairs| {
        pairs
            .into_iter()
            .flat_map(|(amount, currency)| {
                [
                    LineInput::debit(AccountId::new(), amount, currency),
                    LineInput::credit(AccountId::new(), amount, currency),
                ]
            })
            .collect()
    })
}

/// Mock lookup: every account exists and is active.
fn any_active(id: AccountId) -> Option<AccountInfo> {
    Some(AccountInfo {
        id,
        account_type: AccountType::Asset,
        availability: Availability::ACTIVE,
    })
}

fn header() -> EntryHeader {
    EntryHeader {
        entry_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        description: "Property test".to_string(),
        reference: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Posted entries balance in every currency.
    #[test]
    fn prop_posted_entries_are_balanced(lines in balanced_lines()) {
        let draft = JournalService::create_draft(JournalEntryId::new(), header(), &lines, any_active).unwrap();
        let posted = JournalService::post(draft.into(), any_active, Utc::now()).unwrap();

        for totals in totals_by_currency(&posted.lines) {
            prop_assert_eq!(totals.debit, totals.credit);
        }
        prop_assert_eq!(posted.totals, totals_by_currency(&posted.lines));
    }

    /// Skewing one line by any positive amount makes posting fail, naming that currency.
    #[test]
    fn prop_skewed_entries_are_rejected(
        lines in balanced_lines(),
        skew in positive_amount(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut lines = lines;
        let idx = pick.index(lines.len());
        lines[idx].amount += skew;
        let skewed_currency = lines[idx].currency.clone();

        let draft = JournalService::create_draft(JournalEntryId::new(), header(), &lines, any_active).unwrap();
        let err = JournalService::post(draft.into(), any_active, Utc::now()).unwrap_err();

        match err {
            LedgerError::UnbalancedEntry { currency, debit, credit } => {
                prop_assert_eq!(currency.as_str(), skewed_currency.as_str());
                prop_assert_ne!(debit, credit);
            }
            other => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }

    /// Re-posting is always an invalid state transition, never a double apply.
    #[test]
    fn prop_repost_is_invalid_state(lines in balanced_lines()) {
        let draft = JournalService::create_draft(JournalEntryId::new(), header(), &lines, any_active).unwrap();
        let posted = JournalService::post(draft.into(), any_active, Utc::now()).unwrap();
        let result = JournalService::post(posted.into(), any_active, Utc::now());
        let is_invalid_state = matches!(result, Err(LedgerError::InvalidState { .. }));
        prop_assert!(is_invalid_state);
    }
}
