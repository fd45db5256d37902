//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and written with the
//! schema builder, so they run unchanged on PostgreSQL and SQLite.

pub use sea_orm_migration::prelude::*;

mod m20261018_000001_registries;
mod m20261018_000002_journal;
mod m20261018_000003_inventory;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261018_000001_registries::Migration),
            Box::new(m20261018_000002_journal::Migration),
            Box::new(m20261018_000003_inventory::Migration),
        ]
    }
}
