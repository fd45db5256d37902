//! Registry (accounts, items, warehouses) integration tests.

mod common;

use rust_decimal_macros::dec;
use tally_core::inventory::{RecordTransactionInput, TransactionType};
use tally_core::journal::LineInput;
use tally_core::registry::{AccountType, ItemType, ValuationMethod};
use tally_core::{EntityKind, ErrorKind, LedgerError};
use tally_db::entities::sea_orm_active_enums;
use tally_db::repositories::{
    AccountFilter, AccountRepository, CreateAccountInput, CreateEntryInput, CreateItemInput, InventoryRepository,
    ItemFilter, ItemRepository, JournalRepository, UpdateAccountInput, UpdateItemInput, UpdateWarehouseInput,
    WarehouseFilter, WarehouseRepository,
};
use tally_shared::types::{AccountId, ItemId, WarehouseId};

use common::{create_account, create_item, create_warehouse, header, setup_db};

fn child_of(code: &str, parent: AccountId) -> CreateAccountInput {
    CreateAccountInput {
        code: code.to_string(),
        name: format!("Account {code}"),
        description: None,
        account_type: AccountType::Asset,
        parent_id: Some(parent),
        is_active: true,
    }
}

// ============================================================================
// Test: accounts
// ============================================================================

#[tokio::test]
async fn test_create_account_normalizes_and_rejects_duplicates() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());

    let created = repo
        .create_account(CreateAccountInput {
            code: "  1000 ".to_string(),
            name: " Cash ".to_string(),
            description: Some("   ".to_string()),
            account_type: AccountType::Asset,
            parent_id: None,
            is_active: true,
        })
        .await
        .unwrap();
    assert_eq!(created.code, "1000");
    assert_eq!(created.name, "Cash");
    assert_eq!(created.description, None);
    assert_eq!(created.account_type, sea_orm_active_enums::AccountType::Asset);

    let err = repo
        .create_account(CreateAccountInput {
            code: "1000".to_string(),
            name: "Other".to_string(),
            description: None,
            account_type: AccountType::Expense,
            parent_id: None,
            is_active: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::DuplicateCode {
            kind: EntityKind::Account,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Constraint);

    let err = repo
        .create_account(CreateAccountInput {
            code: String::new(),
            name: "Blank".to_string(),
            description: None,
            account_type: AccountType::Asset,
            parent_id: None,
            is_active: true,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_account_hierarchy_rejects_cycles() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());

    let root = AccountId::from(create_account(&db, "1000", AccountType::Asset).await.id);
    let mid = AccountId::from(repo.create_account(child_of("1100", root)).await.unwrap().id);
    let leaf = AccountId::from(repo.create_account(child_of("1110", mid)).await.unwrap().id);

    let err = repo
        .update_account(
            root,
            UpdateAccountInput {
                parent_id: Some(Some(leaf)),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountCycle { .. }));

    let err = repo
        .update_account(
            mid,
            UpdateAccountInput {
                parent_id: Some(Some(mid)),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountCycle { .. }));

    // Detaching and re-attaching elsewhere is fine.
    let moved = repo
        .update_account(
            leaf,
            UpdateAccountInput {
                parent_id: Some(Some(root)),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(root.into_inner()));

    let top_level = repo
        .list_accounts(AccountFilter {
            parent_id: Some(None),
            ..AccountFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(top_level.len(), 1);
}

#[tokio::test]
async fn test_deleted_parent_is_unusable() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());

    let inactive = AccountId::from(create_account(&db, "2000", AccountType::Liability).await.id);
    repo.deactivate_account(inactive).await.unwrap();
    repo.create_account(child_of("2100", inactive)).await.unwrap();

    let deleted = AccountId::from(create_account(&db, "3000", AccountType::Equity).await.id);
    repo.delete_account(deleted).await.unwrap();
    let err = repo.create_account(child_of("3100", deleted)).await.unwrap_err();
    assert!(matches!(err, LedgerError::UnusableReference { .. }));
}

#[tokio::test]
async fn test_account_type_locked_once_referenced() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let cash = AccountId::from(create_account(&db, "1000", AccountType::Asset).await.id);
    let sales = AccountId::from(create_account(&db, "4000", AccountType::Revenue).await.id);
    let spare = AccountId::from(create_account(&db, "9000", AccountType::Asset).await.id);

    JournalRepository::new(db.clone())
        .create_draft(CreateEntryInput {
            header: header("Sale"),
            lines: vec![
                LineInput::debit(cash, dec!(10), "USD"),
                LineInput::credit(sales, dec!(10), "USD"),
            ],
        })
        .await
        .unwrap();

    let err = repo
        .update_account(
            cash,
            UpdateAccountInput {
                account_type: Some(AccountType::Expense),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountTypeLocked(_)));

    // Setting the same type and renaming is still allowed.
    let renamed = repo
        .update_account(
            cash,
            UpdateAccountInput {
                name: Some("Petty cash".to_string()),
                account_type: Some(AccountType::Asset),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Petty cash");

    let retyped = repo
        .update_account(
            spare,
            UpdateAccountInput {
                account_type: Some(AccountType::Expense),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(retyped.account_type, sea_orm_active_enums::AccountType::Expense);

    let err = repo
        .update_account(
            spare,
            UpdateAccountInput {
                code: Some("4000".to_string()),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateCode { .. }));
}

#[tokio::test]
async fn test_soft_delete_and_purge_account() {
    let db = setup_db().await;
    let repo = AccountRepository::new(db.clone());
    let cash = AccountId::from(create_account(&db, "1000", AccountType::Asset).await.id);
    let sales = AccountId::from(create_account(&db, "4000", AccountType::Revenue).await.id);
    let parent = AccountId::from(create_account(&db, "1900", AccountType::Asset).await.id);
    repo.create_account(child_of("1910", parent)).await.unwrap();

    JournalRepository::new(db.clone())
        .create_draft(CreateEntryInput {
            header: header("Sale"),
            lines: vec![
                LineInput::debit(cash, dec!(10), "USD"),
                LineInput::credit(sales, dec!(10), "USD"),
            ],
        })
        .await
        .unwrap();

    let err = repo.purge_account(cash).await.unwrap_err();
    assert!(matches!(err, LedgerError::StillReferenced { references: 1, .. }));
    let err = repo.purge_account(parent).await.unwrap_err();
    assert!(matches!(err, LedgerError::StillReferenced { references: 1, .. }));

    repo.delete_account(cash).await.unwrap();
    assert_eq!(repo.get_account(cash).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(repo.delete_account(cash).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert!(
        repo.list_accounts(AccountFilter::default())
            .await
            .unwrap()
            .iter()
            .all(|a| a.id != cash.into_inner())
    );

    let orphan = AccountId::from(create_account(&db, "7000", AccountType::Expense).await.id);
    repo.purge_account(orphan).await.unwrap();
    assert_eq!(repo.purge_account(orphan).await.unwrap_err().kind(), ErrorKind::NotFound);
}

// ============================================================================
// Test: items
// ============================================================================

#[tokio::test]
async fn test_item_lifecycle() {
    let db = setup_db().await;
    let repo = ItemRepository::new(db.clone());

    let item = repo
        .create_item(CreateItemInput {
            sku: "WID-1".to_string(),
            name: "Widget".to_string(),
            description: None,
            unit_of_measure: "PCS".to_string(),
            item_type: ItemType::FinishedGood,
            purchase_price: Some(dec!(4.50)),
            sales_price: Some(dec!(9.99)),
            valuation_method: Some(ValuationMethod::Fifo),
            is_active: true,
        })
        .await
        .unwrap();
    assert_eq!(item.purchase_price, Some(dec!(4.5)));
    let id = ItemId::from(item.id);

    let updated = repo
        .update_item(
            id,
            UpdateItemInput {
                sales_price: Some(None),
                item_type: Some(ItemType::NonInventory),
                ..UpdateItemInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.sales_price, None);
    assert_eq!(updated.item_type, sea_orm_active_enums::ItemType::NonInventory);

    let err = repo
        .update_item(
            id,
            UpdateItemInput {
                purchase_price: Some(Some(dec!(-1))),
                ..UpdateItemInput::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let services = repo
        .list_items(ItemFilter {
            item_type: Some(ItemType::NonInventory),
            ..ItemFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(services.len(), 1);

    repo.delete_item(id).await.unwrap();
    assert_eq!(repo.get_item(id).await.unwrap_err().kind(), ErrorKind::NotFound);
    repo.purge_item(id).await.unwrap();
}

#[tokio::test]
async fn test_item_and_warehouse_with_history_cannot_be_purged() {
    let db = setup_db().await;
    let item = ItemId::from(create_item(&db, "SKU-1", ItemType::RawMaterial).await.id);
    let warehouse = WarehouseId::from(create_warehouse(&db, "MAIN").await.id);

    InventoryRepository::new(db.clone())
        .record_transaction(RecordTransactionInput {
            item_id: item,
            warehouse_id: warehouse,
            quantity: dec!(5),
            transaction_type: TransactionType::ReceiveStock,
            reference_id: None,
            transaction_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let err = ItemRepository::new(db.clone()).purge_item(item).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::StillReferenced {
            kind: EntityKind::Item,
            references: 1,
            ..
        }
    ));

    let err = WarehouseRepository::new(db.clone())
        .purge_warehouse(warehouse)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::StillReferenced {
            kind: EntityKind::Warehouse,
            ..
        }
    ));

    // Soft delete is always allowed.
    ItemRepository::new(db.clone()).delete_item(item).await.unwrap();
}

// ============================================================================
// Test: warehouses
// ============================================================================

#[tokio::test]
async fn test_warehouse_update_and_filters() {
    let db = setup_db().await;
    let repo = WarehouseRepository::new(db.clone());
    let main = WarehouseId::from(create_warehouse(&db, "MAIN").await.id);
    let annex = WarehouseId::from(create_warehouse(&db, "ANNEX").await.id);

    let updated = repo
        .update_warehouse(
            main,
            UpdateWarehouseInput {
                location: Some(Some("Dock 4".to_string())),
                ..UpdateWarehouseInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.location.as_deref(), Some("Dock 4"));

    let err = repo
        .update_warehouse(
            annex,
            UpdateWarehouseInput {
                code: Some("MAIN".to_string()),
                ..UpdateWarehouseInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::DuplicateCode {
            kind: EntityKind::Warehouse,
            ..
        }
    ));

    repo.deactivate_warehouse(annex).await.unwrap();
    let active = repo
        .list_warehouses(WarehouseFilter { is_active: Some(true) })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].code, "MAIN");

    // Deactivated records stay readable.
    assert!(!repo.get_warehouse(annex).await.unwrap().is_active);
}
