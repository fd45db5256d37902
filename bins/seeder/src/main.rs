//! Database seeder for Tally development data.
//!
//! Seeds a small chart of accounts, a few items and warehouses, one posted
//! opening entry and opening stock. Safe to run repeatedly: records whose
//! code already exists are reused and the opening data is only written to
//! an empty ledger.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use tally_core::inventory::{RecordTransactionInput, TransactionType};
use tally_core::journal::{EntryHeader, LineInput};
use tally_core::registry::{AccountType, ItemType, ValuationMethod};
use tally_db::repositories::{
    AccountFilter, AccountRepository, CreateAccountInput, CreateEntryInput, CreateItemInput, CreateWarehouseInput,
    EntryFilter, InventoryRepository, ItemFilter, ItemRepository, JournalRepository, TransactionFilter,
    WarehouseFilter, WarehouseRepository,
};
use tally_shared::AppConfig;
use tally_shared::types::{AccountId, ItemId, JournalEntryId, PageRequest, WarehouseId};
use tracing::info;

/// (code, name, type, parent code)
const ACCOUNTS: &[(&str, &str, AccountType, Option<&str>)] = &[
    ("1000", "Current Assets", AccountType::Asset, None),
    ("1100", "Cash", AccountType::Asset, Some("1000")),
    ("1200", "Inventory", AccountType::Asset, Some("1000")),
    ("2000", "Accounts Payable", AccountType::Liability, None),
    ("3000", "Owner's Equity", AccountType::Equity, None),
    ("4000", "Sales Revenue", AccountType::Revenue, None),
    ("5000", "Cost of Goods Sold", AccountType::Expense, None),
];

/// (sku, name, unit, type, purchase price, sales price)
const ITEMS: &[(&str, &str, &str, ItemType, Decimal, Decimal)] = &[
    ("RM-STEEL", "Steel sheet", "KG", ItemType::RawMaterial, dec!(2.40), dec!(0)),
    ("FG-WIDGET", "Widget", "PCS", ItemType::FinishedGood, dec!(4.50), dec!(9.99)),
    ("SV-INSTALL", "Installation service", "HR", ItemType::NonInventory, dec!(0), dec!(45.00)),
];

/// (code, name, location)
const WAREHOUSES: &[(&str, &str, &str)] = &[
    ("MAIN", "Main warehouse", "Building A"),
    ("ANNEX", "Annex", "Building B"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "tally=info".into()),
        )
        .init();

    let config = AppConfig::load()?;
    let db = tally_db::connect(&config.database.url).await?;
    tally_db::migrate(&db).await?;
    info!("Connected to database, schema up to date");

    let accounts = seed_accounts(&db).await?;
    let items = seed_items(&db).await?;
    let warehouses = seed_warehouses(&db).await?;
    seed_opening_entry(&db, &accounts).await?;
    seed_opening_stock(&db, &items, &warehouses).await?;

    info!("Seeding complete");
    Ok(())
}

fn lookup<'a, T: Copy>(seeded: &'a [(&'a str, T)], code: &str) -> anyhow::Result<T> {
    seeded
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, id)| *id)
        .with_context(|| format!("seeded record {code} missing"))
}

async fn seed_accounts(db: &DatabaseConnection) -> anyhow::Result<Vec<(&'static str, AccountId)>> {
    let repo = AccountRepository::new(db.clone());
    let existing = repo.list_accounts(AccountFilter::default()).await?;
    let mut seeded: Vec<(&'static str, AccountId)> = Vec::new();

    for &(code, name, account_type, parent) in ACCOUNTS {
        if let Some(account) = existing.iter().find(|a| a.code == code) {
            info!(code, "Account already exists, skipping");
            seeded.push((code, account.id.into()));
            continue;
        }
        let parent_id = parent.map(|p| lookup(&seeded, p)).transpose()?;
        let account = repo
            .create_account(CreateAccountInput {
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                account_type,
                parent_id,
                is_active: true,
            })
            .await?;
        seeded.push((code, account.id.into()));
    }
    Ok(seeded)
}

async fn seed_items(db: &DatabaseConnection) -> anyhow::Result<Vec<(&'static str, ItemId)>> {
    let repo = ItemRepository::new(db.clone());
    let existing = repo.list_items(ItemFilter::default()).await?;
    let mut seeded = Vec::new();

    for &(sku, name, unit, item_type, purchase, sales) in ITEMS {
        if let Some(item) = existing.iter().find(|i| i.sku == sku) {
            info!(sku, "Item already exists, skipping");
            seeded.push((sku, item.id.into()));
            continue;
        }
        let item = repo
            .create_item(CreateItemInput {
                sku: sku.to_string(),
                name: name.to_string(),
                description: None,
                unit_of_measure: unit.to_string(),
                item_type,
                purchase_price: (!purchase.is_zero()).then_some(purchase),
                sales_price: (!sales.is_zero()).then_some(sales),
                valuation_method: item_type.carries_stock().then_some(ValuationMethod::WeightedAverage),
                is_active: true,
            })
            .await?;
        seeded.push((sku, item.id.into()));
    }
    Ok(seeded)
}

async fn seed_warehouses(db: &DatabaseConnection) -> anyhow::Result<Vec<(&'static str, WarehouseId)>> {
    let repo = WarehouseRepository::new(db.clone());
    let existing = repo.list_warehouses(WarehouseFilter::default()).await?;
    let mut seeded = Vec::new();

    for &(code, name, location) in WAREHOUSES {
        if let Some(warehouse) = existing.iter().find(|w| w.code == code) {
            info!(code, "Warehouse already exists, skipping");
            seeded.push((code, warehouse.id.into()));
            continue;
        }
        let warehouse = repo
            .create_warehouse(CreateWarehouseInput {
                code: code.to_string(),
                name: name.to_string(),
                location: Some(location.to_string()),
                is_active: true,
            })
            .await?;
        seeded.push((code, warehouse.id.into()));
    }
    Ok(seeded)
}

async fn seed_opening_entry(db: &DatabaseConnection, accounts: &[(&str, AccountId)]) -> anyhow::Result<()> {
    let repo = JournalRepository::new(db.clone());
    let existing = repo.list_entries(EntryFilter::default(), PageRequest::new(1, 1)).await?;
    if existing.meta.total > 0 {
        info!("Journal already has entries, skipping opening entry");
        return Ok(());
    }

    let draft = repo
        .create_draft(CreateEntryInput {
            header: EntryHeader {
                entry_date: Utc::now().date_naive(),
                description: "Opening balances".to_string(),
                reference: Some("OPENING".to_string()),
            },
            lines: vec![
                LineInput::debit(lookup(accounts, "1100")?, dec!(10000.00), "USD"),
                LineInput::debit(lookup(accounts, "1200")?, dec!(1650.00), "USD"),
                LineInput::credit(lookup(accounts, "3000")?, dec!(11650.00), "USD"),
            ],
        })
        .await?;
    repo.post_entry(JournalEntryId::from(draft.entry.id)).await?;
    Ok(())
}

async fn seed_opening_stock(
    db: &DatabaseConnection,
    items: &[(&str, ItemId)],
    warehouses: &[(&str, WarehouseId)],
) -> anyhow::Result<()> {
    let repo = InventoryRepository::new(db.clone());
    let existing = repo
        .list_transactions(TransactionFilter::default(), PageRequest::new(1, 1))
        .await?;
    if existing.meta.total > 0 {
        info!("Inventory ledger is not empty, skipping opening stock");
        return Ok(());
    }

    let main = lookup(warehouses, "MAIN")?;
    let annex = lookup(warehouses, "ANNEX")?;
    let receipts = [
        (lookup(items, "RM-STEEL")?, main, dec!(250.5)),
        (lookup(items, "FG-WIDGET")?, main, dec!(200)),
        (lookup(items, "FG-WIDGET")?, annex, dec!(33)),
    ];

    for (item_id, warehouse_id, quantity) in receipts {
        repo.record_transaction(RecordTransactionInput {
            item_id,
            warehouse_id,
            quantity,
            transaction_type: TransactionType::ReceiveStock,
            reference_id: None,
            transaction_date: None,
            notes: Some("Opening stock".to_string()),
        })
        .await?;
    }
    Ok(())
}
