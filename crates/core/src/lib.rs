//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `registry` - Accounts, items and warehouses as referenced by the ledgers
//! - `journal` - Double-entry bookkeeping logic
//! - `inventory` - Stock movements and derived stock levels

pub mod error;
pub mod inventory;
pub mod journal;
pub mod registry;

pub use error::{EntityKind, ErrorKind, LedgerError, LedgerResult, Unusable};
