//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every mutating operation runs in exactly one database transaction; domain
//! rules come from `tally-core`, so repositories only load, persist and map
//! errors.

pub mod account;
pub mod inventory;
pub mod item;
pub mod journal;
pub mod stock;
pub mod warehouse;

pub use account::{AccountFilter, AccountRepository, CreateAccountInput, UpdateAccountInput};
pub use inventory::{InventoryRepository, TransactionFilter};
pub use item::{CreateItemInput, ItemFilter, ItemRepository, UpdateItemInput};
pub use journal::{CreateEntryInput, EntryFilter, EntryWithLines, JournalRepository, UpdateEntryInput};
pub use stock::StockRepository;
pub use warehouse::{CreateWarehouseInput, UpdateWarehouseInput, WarehouseFilter, WarehouseRepository};

use sea_orm::{DbErr, SqlErr};
use tally_core::{EntityKind, LedgerError};

/// Maps a storage failure into the ledger error space.
pub(crate) fn db_err(err: DbErr) -> LedgerError {
    tracing::error!(error = %err, "Database operation failed");
    LedgerError::Database(err.to_string())
}

/// Maps an insert/update failure, turning unique violations into `DuplicateCode`.
///
/// The code is pre-checked before writing; this covers the race where a
/// concurrent writer takes the same code in between.
pub(crate) fn write_err(kind: EntityKind, code: &str) -> impl FnOnce(DbErr) -> LedgerError + '_ {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => LedgerError::DuplicateCode {
            kind,
            code: code.to_string(),
        },
        _ => db_err(err),
    }
}
