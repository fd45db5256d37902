//! `SeaORM` entity definitions.

pub mod accounts;
pub mod inventory_transactions;
pub mod items;
pub mod journal_entries;
pub mod journal_lines;
pub mod sea_orm_active_enums;
pub mod warehouses;

use sea_orm::prelude::DateTimeWithTimeZone;

/// Current time as stored in timestamp columns (UTC offset).
#[must_use]
pub fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().fixed_offset()
}
