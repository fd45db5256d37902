//! Journal repository integration tests.
//!
//! Exercises the full draft -> posted -> voided lifecycle against a real
//! (in-memory SQLite) database, including the failure paths that must leave
//! the stored entry untouched.

mod common;

use common::{create_account, header, setup_db};
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use tally_core::journal::{EntryStatus, LineInput};
use tally_core::registry::AccountType;
use tally_core::{ErrorKind, LedgerError, Unusable};
use tally_db::entities::{accounts, sea_orm_active_enums};
use tally_db::repositories::{AccountRepository, CreateEntryInput, EntryFilter, JournalRepository, UpdateEntryInput};
use tally_shared::types::{AccountId, CurrencyCode, JournalEntryId, PageRequest};

fn id_of(account: &accounts::Model) -> AccountId {
    AccountId::from(account.id)
}

async fn cash_and_revenue(db: &DatabaseConnection) -> (AccountId, AccountId) {
    let cash = create_account(db, "1000", AccountType::Asset).await;
    let revenue = create_account(db, "4000", AccountType::Revenue).await;
    (id_of(&cash), id_of(&revenue))
}

fn sale(cash: AccountId, revenue: AccountId, debit: rust_decimal::Decimal, credit: rust_decimal::Decimal) -> CreateEntryInput {
    CreateEntryInput {
        header: header("Cash sale"),
        lines: vec![
            LineInput::debit(cash, debit, "USD"),
            LineInput::credit(revenue, credit, "USD"),
        ],
    }
}

// ============================================================================
// Test: posting
// ============================================================================

#[tokio::test]
async fn test_balanced_entry_posts() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let draft = repo.create_draft(sale(cash, revenue, dec!(100.00), dec!(100.00))).await.unwrap();
    assert_eq!(draft.entry.status, sea_orm_active_enums::EntryStatus::Draft);
    assert_eq!(draft.entry.version, 1);
    assert_eq!(draft.lines.len(), 2);

    let posted = repo.post_entry(JournalEntryId::from(draft.entry.id)).await.unwrap();
    assert_eq!(posted.entry.status, sea_orm_active_enums::EntryStatus::Posted);
    assert_eq!(posted.entry.version, 2);
    assert!(posted.entry.posted_at.is_some());
    assert_eq!(posted.lines[0].amount, dec!(100.00));
}

#[tokio::test]
async fn test_unbalanced_entry_stays_draft() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let draft = repo.create_draft(sale(cash, revenue, dec!(100), dec!(90))).await.unwrap();
    let id = JournalEntryId::from(draft.entry.id);

    let err = repo.post_entry(id).await.unwrap_err();
    match err {
        LedgerError::UnbalancedEntry { currency, debit, credit } => {
            assert_eq!(currency, CurrencyCode::USD);
            assert_eq!(debit, dec!(100));
            assert_eq!(credit, dec!(90));
        }
        other => panic!("expected UnbalancedEntry, got {other:?}"),
    }

    let stored = repo.get_entry(id).await.unwrap();
    assert_eq!(stored.entry.status, sea_orm_active_enums::EntryStatus::Draft);
    assert_eq!(stored.entry.version, 1);
}

#[tokio::test]
async fn test_amounts_finer_than_storage_are_rejected() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    // Would store as 100.0000 / 100.0000 and post although unbalanced.
    let err = repo
        .create_draft(sale(cash, revenue, dec!(100.00004), dec!(100.00001)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AmountPrecision { line: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Would store as zero.
    let err = repo
        .create_draft(sale(cash, revenue, dec!(0.00001), dec!(0.00001)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AmountPrecision { .. }));

    let draft = repo.create_draft(sale(cash, revenue, dec!(0.0001), dec!(0.0001))).await.unwrap();
    let id = JournalEntryId::from(draft.entry.id);
    let err = repo
        .update_draft(
            id,
            UpdateEntryInput {
                header: None,
                lines: vec![
                    LineInput::debit(cash, dec!(10.12345), "USD"),
                    LineInput::credit(revenue, dec!(10.12345), "USD"),
                ],
                expected_version: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AmountPrecision { .. }));

    let stored = repo.get_entry(id).await.unwrap();
    assert_eq!(stored.entry.version, 1);
    assert_eq!(stored.lines[0].amount, dec!(0.0001));
    let posted = repo.post_entry(id).await.unwrap();
    assert_eq!(posted.entry.status, sea_orm_active_enums::EntryStatus::Posted);
}

#[tokio::test]
async fn test_currencies_balance_independently() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let draft = repo
        .create_draft(CreateEntryInput {
            header: header("Two currencies"),
            lines: vec![
                LineInput::debit(cash, dec!(100), "USD"),
                LineInput::credit(revenue, dec!(100), "USD"),
                LineInput::debit(cash, dec!(50), "eur"),
                LineInput::credit(revenue, dec!(40), "EUR"),
            ],
        })
        .await
        .unwrap();
    assert_eq!(draft.lines[2].currency, "EUR");

    let err = repo.post_entry(JournalEntryId::from(draft.entry.id)).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::UnbalancedEntry { currency, .. } if currency == CurrencyCode::EUR
    ));
}

#[tokio::test]
async fn test_posting_twice_is_invalid_state() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let draft = repo.create_draft(sale(cash, revenue, dec!(10), dec!(10))).await.unwrap();
    let id = JournalEntryId::from(draft.entry.id);
    repo.post_entry(id).await.unwrap();

    let err = repo.post_entry(id).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidState {
            status: EntryStatus::Posted,
            ..
        }
    ));
}

#[tokio::test]
async fn test_stale_version_is_concurrent_modification() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let draft = repo.create_draft(sale(cash, revenue, dec!(10), dec!(10))).await.unwrap();
    let id = JournalEntryId::from(draft.entry.id);

    let edited = repo
        .update_draft(
            id,
            UpdateEntryInput {
                header: None,
                lines: vec![
                    LineInput::debit(cash, dec!(20), "USD"),
                    LineInput::credit(revenue, dec!(20), "USD"),
                ],
                expected_version: Some(1),
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.entry.version, 2);

    let err = repo.post_entry_checked(id, Some(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConcurrentModification);
    assert!(err.is_retryable());

    let posted = repo.post_entry_checked(id, Some(2)).await.unwrap();
    assert_eq!(posted.entry.status, sea_orm_active_enums::EntryStatus::Posted);
}

#[tokio::test]
async fn test_posting_rejects_account_deactivated_after_drafting() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let draft = repo.create_draft(sale(cash, revenue, dec!(10), dec!(10))).await.unwrap();
    AccountRepository::new(db.clone()).deactivate_account(revenue).await.unwrap();

    let id = JournalEntryId::from(draft.entry.id);
    let err = repo.post_entry(id).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::UnusableReference {
            reason: Unusable::Inactive,
            ..
        }
    ));
    assert_eq!(
        repo.get_entry(id).await.unwrap().entry.status,
        sea_orm_active_enums::EntryStatus::Draft
    );
}

// ============================================================================
// Test: drafting
// ============================================================================

#[tokio::test]
async fn test_create_draft_validation() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let single = CreateEntryInput {
        header: header("One line"),
        lines: vec![LineInput::debit(cash, dec!(10), "USD")],
    };
    assert!(matches!(
        repo.create_draft(single).await.unwrap_err(),
        LedgerError::InsufficientLines(1)
    ));

    let zero = sale(cash, revenue, dec!(0), dec!(0));
    assert!(matches!(
        repo.create_draft(zero).await.unwrap_err(),
        LedgerError::NonPositiveAmount { line: 1, .. }
    ));

    let unknown = sale(cash, AccountId::new(), dec!(10), dec!(10));
    assert!(matches!(
        repo.create_draft(unknown).await.unwrap_err(),
        LedgerError::UnusableReference {
            reason: Unusable::Missing,
            ..
        }
    ));

    let page = repo.list_entries(EntryFilter::default(), PageRequest::default()).await.unwrap();
    assert_eq!(page.meta.total, 0);
}

#[tokio::test]
async fn test_update_draft_replaces_lines() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let bank = id_of(&create_account(&db, "1010", AccountType::Asset).await);
    let repo = JournalRepository::new(db.clone());

    let draft = repo.create_draft(sale(cash, revenue, dec!(10), dec!(10))).await.unwrap();
    let id = JournalEntryId::from(draft.entry.id);

    let mut new_header = header("Bank sale");
    new_header.reference = Some("INV-7".to_string());
    let updated = repo
        .update_draft(
            id,
            UpdateEntryInput {
                header: Some(new_header),
                lines: vec![
                    LineInput::debit(bank, dec!(30), "USD"),
                    LineInput::credit(revenue, dec!(20), "USD"),
                    LineInput::credit(revenue, dec!(10), "USD"),
                ],
                expected_version: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.entry.description, "Bank sale");
    assert_eq!(updated.entry.reference.as_deref(), Some("INV-7"));
    assert_eq!(updated.lines.len(), 3);
    assert_eq!(updated.lines[0].account_id, bank.into_inner());
    assert_eq!(
        updated.lines.iter().map(|l| l.line_no).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn test_posted_entry_is_immutable() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let draft = repo.create_draft(sale(cash, revenue, dec!(10), dec!(10))).await.unwrap();
    let id = JournalEntryId::from(draft.entry.id);
    repo.post_entry(id).await.unwrap();

    let err = repo
        .update_draft(
            id,
            UpdateEntryInput {
                header: None,
                lines: vec![
                    LineInput::debit(cash, dec!(99), "USD"),
                    LineInput::credit(revenue, dec!(99), "USD"),
                ],
                expected_version: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    assert_eq!(repo.delete_draft_entry(id).await.unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(repo.purge_draft_entry(id).await.unwrap_err().kind(), ErrorKind::InvalidState);

    let stored = repo.get_entry(id).await.unwrap();
    assert_eq!(stored.lines[0].amount, dec!(10));
}

#[tokio::test]
async fn test_delete_and_purge_draft() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let first = repo.create_draft(sale(cash, revenue, dec!(1), dec!(1))).await.unwrap();
    let first_id = JournalEntryId::from(first.entry.id);
    repo.delete_draft_entry(first_id).await.unwrap();
    assert_eq!(repo.get_entry(first_id).await.unwrap_err().kind(), ErrorKind::NotFound);

    // Soft-deleted drafts can still be purged.
    repo.purge_draft_entry(first_id).await.unwrap();

    let second = repo.create_draft(sale(cash, revenue, dec!(2), dec!(2))).await.unwrap();
    let second_id = JournalEntryId::from(second.entry.id);
    repo.purge_draft_entry(second_id).await.unwrap();
    assert_eq!(repo.get_entry(second_id).await.unwrap_err().kind(), ErrorKind::NotFound);

    // No lines survive, so both accounts can now be purged.
    let accounts = AccountRepository::new(db.clone());
    accounts.purge_account(cash).await.unwrap();
    accounts.purge_account(revenue).await.unwrap();
}

// ============================================================================
// Test: voiding
// ============================================================================

#[tokio::test]
async fn test_void_only_from_posted() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let draft = repo.create_draft(sale(cash, revenue, dec!(10), dec!(10))).await.unwrap();
    let id = JournalEntryId::from(draft.entry.id);

    let err = repo.void_entry(id, None).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidState {
            status: EntryStatus::Draft,
            ..
        }
    ));

    repo.post_entry(id).await.unwrap();
    let voided = repo.void_entry(id, Some("Duplicate".to_string())).await.unwrap();
    assert_eq!(voided.entry.status, sea_orm_active_enums::EntryStatus::Voided);
    assert_eq!(voided.entry.void_reason.as_deref(), Some("Duplicate"));
    assert!(voided.entry.voided_at.is_some());
    assert_eq!(voided.entry.version, 3);

    let err = repo.void_entry(id, None).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidState {
            status: EntryStatus::Voided,
            ..
        }
    ));
}

// ============================================================================
// Test: queries
// ============================================================================

#[tokio::test]
async fn test_list_entries_filters() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let expense = id_of(&create_account(&db, "5000", AccountType::Expense).await);
    let repo = JournalRepository::new(db.clone());

    let posted = repo.create_draft(sale(cash, revenue, dec!(10), dec!(10))).await.unwrap();
    repo.post_entry(JournalEntryId::from(posted.entry.id)).await.unwrap();
    repo.create_draft(sale(cash, revenue, dec!(20), dec!(20))).await.unwrap();
    repo.create_draft(CreateEntryInput {
        header: header("Rent"),
        lines: vec![
            LineInput::debit(expense, dec!(500), "USD"),
            LineInput::credit(cash, dec!(500), "USD"),
        ],
    })
    .await
    .unwrap();

    let all = repo.list_entries(EntryFilter::default(), PageRequest::default()).await.unwrap();
    assert_eq!(all.meta.total, 3);
    assert!(all.data.iter().all(|e| e.lines.len() == 2));

    let drafts = repo
        .list_entries(
            EntryFilter {
                status: Some(EntryStatus::Draft),
                ..EntryFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(drafts.meta.total, 2);

    let touching_expense = repo
        .list_entries(
            EntryFilter {
                account_id: Some(expense),
                ..EntryFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(touching_expense.meta.total, 1);
    assert_eq!(touching_expense.data[0].entry.description, "Rent");

    let paged = repo.list_entries(EntryFilter::default(), PageRequest::new(2, 2)).await.unwrap();
    assert_eq!(paged.data.len(), 1);
    assert_eq!(paged.meta.total_pages, 2);
}

#[tokio::test]
async fn test_account_balances_count_posted_lines_only() {
    let db = setup_db().await;
    let (cash, revenue) = cash_and_revenue(&db).await;
    let repo = JournalRepository::new(db.clone());

    let posted = repo.create_draft(sale(cash, revenue, dec!(100), dec!(100))).await.unwrap();
    repo.post_entry(JournalEntryId::from(posted.entry.id)).await.unwrap();
    repo.create_draft(sale(cash, revenue, dec!(40), dec!(40))).await.unwrap();

    let voided = repo.create_draft(sale(cash, revenue, dec!(7), dec!(7))).await.unwrap();
    let voided_id = JournalEntryId::from(voided.entry.id);
    repo.post_entry(voided_id).await.unwrap();
    repo.void_entry(voided_id, None).await.unwrap();

    let accounts = AccountRepository::new(db.clone());
    let cash_balances = accounts.account_balances(cash).await.unwrap();
    assert_eq!(cash_balances.len(), 1);
    assert_eq!(cash_balances[0].currency, CurrencyCode::USD);
    assert_eq!(cash_balances[0].debit_total, dec!(100));
    assert_eq!(cash_balances[0].balance, dec!(100));

    let revenue_balances = accounts.account_balances(revenue).await.unwrap();
    assert_eq!(revenue_balances[0].credit_total, dec!(100));
    assert_eq!(revenue_balances[0].balance, dec!(100));
}
