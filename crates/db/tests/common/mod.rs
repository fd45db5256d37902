//! Shared fixtures for repository integration tests.
//!
//! Every test gets its own in-memory SQLite database migrated by the real
//! `Migrator`. The pool holds exactly one connection so the database lives
//! as long as the pool does.

#![allow(dead_code)]

use std::time::Duration;

use chrono::NaiveDate;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tally_core::registry::{AccountType, ItemType};
use tally_db::entities::{accounts, items, warehouses};
use tally_db::repositories::{
    AccountRepository, CreateAccountInput, CreateItemInput, CreateWarehouseInput, ItemRepository, WarehouseRepository,
};
use tally_db::migrate;
use tally_core::journal::EntryHeader;

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(3600))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    let db = Database::connect(options).await.expect("connect to in-memory sqlite");
    migrate(&db).await.expect("run migrations");
    db
}

pub async fn create_account(db: &DatabaseConnection, code: &str, account_type: AccountType) -> accounts::Model {
    AccountRepository::new(db.clone())
        .create_account(CreateAccountInput {
            code: code.to_string(),
            name: format!("Account {code}"),
            description: None,
            account_type,
            parent_id: None,
            is_active: true,
        })
        .await
        .expect("create account")
}

pub async fn create_item(db: &DatabaseConnection, sku: &str, item_type: ItemType) -> items::Model {
    ItemRepository::new(db.clone())
        .create_item(CreateItemInput {
            sku: sku.to_string(),
            name: format!("Item {sku}"),
            description: None,
            unit_of_measure: "PCS".to_string(),
            item_type,
            purchase_price: None,
            sales_price: None,
            valuation_method: None,
            is_active: true,
        })
        .await
        .expect("create item")
}

pub async fn create_warehouse(db: &DatabaseConnection, code: &str) -> warehouses::Model {
    WarehouseRepository::new(db.clone())
        .create_warehouse(CreateWarehouseInput {
            code: code.to_string(),
            name: format!("Warehouse {code}"),
            location: None,
            is_active: true,
        })
        .await
        .expect("create warehouse")
}

pub fn header(description: &str) -> EntryHeader {
    EntryHeader {
        entry_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        description: description.to_string(),
        reference: None,
    }
}
