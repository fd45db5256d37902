//! Ledger error types.
//!
//! Every failure the engine can report is a `LedgerError`. Each variant
//! belongs to exactly one [`ErrorKind`], which is what callers branch on;
//! the variant itself carries the structured detail (offending currency,
//! entity id, current status, ...).

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::CurrencyCode;
use thiserror::Error;
use uuid::Uuid;

use crate::journal::EntryStatus;

/// Result type alias using `LedgerError`.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input violates a rule checked before any state change.
    Validation,
    /// The targeted record does not exist (or is soft-deleted).
    NotFound,
    /// Operation not permitted in the record's lifecycle state.
    InvalidState,
    /// Debits and credits differ for at least one currency.
    UnbalancedEntry,
    /// Lost an optimistic concurrency race.
    ConcurrentModification,
    /// Integrity rule violation (uniqueness, references, history).
    Constraint,
    /// Storage or other unexpected failure.
    Internal,
}

/// Kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Chart of accounts entry.
    Account,
    /// Inventory item.
    Item,
    /// Warehouse.
    Warehouse,
    /// Journal entry.
    JournalEntry,
    /// Inventory transaction.
    InventoryTransaction,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Account => "Account",
            Self::Item => "Item",
            Self::Warehouse => "Warehouse",
            Self::JournalEntry => "Journal entry",
            Self::InventoryTransaction => "Inventory transaction",
        })
    }
}

/// Why a referenced record cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unusable {
    /// No record with that id.
    Missing,
    /// Record exists but is deactivated.
    Inactive,
    /// Record is soft-deleted.
    Deleted,
}

impl std::fmt::Display for Unusable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Missing => "unknown",
            Self::Inactive => "inactive",
            Self::Deleted => "deleted",
        })
    }
}

/// Errors that can occur during ledger and inventory operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Journal entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines, got {0}")]
    InsufficientLines(usize),

    /// Line amount must be strictly positive.
    #[error("Line {line} amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// 1-based position of the offending line.
        line: usize,
        /// The rejected amount.
        amount: Decimal,
    },

    /// Line amount has more fractional digits than the ledger stores.
    #[error("Line {line} amount {amount} has more than 4 decimal places")]
    AmountPrecision {
        /// 1-based position of the offending line.
        line: usize,
        /// The rejected amount.
        amount: Decimal,
    },

    /// Currency code is not three letters.
    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),

    /// Quantity must be strictly positive.
    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    /// Quantity has more fractional digits than the ledger stores.
    #[error("Quantity {0} has more than 3 decimal places")]
    QuantityPrecision(Decimal),

    /// Input references a record that is unknown, inactive or deleted.
    #[error("{kind} {id} is {reason}")]
    UnusableReference {
        /// Kind of the referenced record.
        kind: EntityKind,
        /// The referenced id.
        id: Uuid,
        /// Why it cannot be used.
        reason: Unusable,
    },

    /// Item type does not carry stock.
    #[error("Item {0} is a non-inventory item and cannot carry stock")]
    NonInventoryItem(Uuid),

    /// Transfer with identical source and destination.
    #[error("Transfer source and destination warehouse must differ ({0})")]
    SameWarehouseTransfer(Uuid),

    /// Reparenting would make an account its own ancestor.
    #[error("Account {account_id} cannot be placed under {parent_id}: cycle in hierarchy")]
    AccountCycle {
        /// Account being moved.
        account_id: Uuid,
        /// Proposed parent.
        parent_id: Uuid,
    },

    /// A required field is empty or malformed.
    #[error("Invalid {field}: {message}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    // ========== Not Found ==========
    /// Target record not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of the missing record.
        kind: EntityKind,
        /// The requested id.
        id: Uuid,
    },

    // ========== Lifecycle Errors ==========
    /// Transition or edit not allowed from the current status.
    #[error("Cannot {action} journal entry in {status} status")]
    InvalidState {
        /// Current status of the entry.
        status: EntryStatus,
        /// The attempted operation.
        action: &'static str,
    },

    // ========== Balance Errors ==========
    /// Debits and credits differ within one currency.
    #[error("Journal entry is not balanced in {currency}. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// The currency group that does not balance.
        currency: CurrencyCode,
        /// Sum of debit lines in that currency.
        debit: Decimal,
        /// Sum of credit lines in that currency.
        credit: Decimal,
    },

    // ========== Concurrency Errors ==========
    /// The entry was changed after it was read.
    #[error("Journal entry {0} was modified concurrently, please retry")]
    ConcurrentModification(Uuid),

    // ========== Constraint Errors ==========
    /// Unique code already taken.
    #[error("{kind} code '{code}' already exists")]
    DuplicateCode {
        /// Kind of record.
        kind: EntityKind,
        /// The duplicate code.
        code: String,
    },

    /// Record is still referenced and cannot be removed.
    #[error("{kind} {id} is referenced by {references} record(s) and cannot be deleted")]
    StillReferenced {
        /// Kind of record.
        kind: EntityKind,
        /// The record id.
        id: Uuid,
        /// Number of referencing rows.
        references: u64,
    },

    /// Account type is frozen once lines reference the account.
    #[error("Cannot change type of account {0} because it has journal lines")]
    AccountTypeLocked(Uuid),

    /// Inventory transaction already has a counter-transaction.
    #[error("Inventory transaction {0} has already been reversed")]
    AlreadyReversed(Uuid),

    // ========== Infrastructure ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Shorthand for [`LedgerError::NotFound`].
    #[must_use]
    pub fn not_found(kind: EntityKind, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Shorthand for [`LedgerError::InvalidField`].
    #[must_use]
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Returns the kind this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLines(_)
            | Self::NonPositiveAmount { .. }
            | Self::AmountPrecision { .. }
            | Self::InvalidCurrency(_)
            | Self::NonPositiveQuantity(_)
            | Self::QuantityPrecision(_)
            | Self::UnusableReference { .. }
            | Self::NonInventoryItem(_)
            | Self::SameWarehouseTransfer(_)
            | Self::AccountCycle { .. }
            | Self::InvalidField { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::UnbalancedEntry { .. } => ErrorKind::UnbalancedEntry,
            Self::ConcurrentModification(_) => ErrorKind::ConcurrentModification,
            Self::DuplicateCode { .. }
            | Self::StillReferenced { .. }
            | Self::AccountTypeLocked(_)
            | Self::AlreadyReversed(_) => ErrorKind::Constraint,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines(_) => "INSUFFICIENT_LINES",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::AmountPrecision { .. } => "AMOUNT_PRECISION",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_QUANTITY",
            Self::QuantityPrecision(_) => "QUANTITY_PRECISION",
            Self::UnusableReference { .. } => "UNUSABLE_REFERENCE",
            Self::NonInventoryItem(_) => "NON_INVENTORY_ITEM",
            Self::SameWarehouseTransfer(_) => "SAME_WAREHOUSE_TRANSFER",
            Self::AccountCycle { .. } => "ACCOUNT_CYCLE",
            Self::InvalidField { .. } => "INVALID_FIELD",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::DuplicateCode { .. } => "DUPLICATE_CODE",
            Self::StillReferenced { .. } => "STILL_REFERENCED",
            Self::AccountTypeLocked(_) => "ACCOUNT_TYPE_LOCKED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            // 400 Bad Request - validation errors
            ErrorKind::Validation => 400,
            // 404 Not Found
            ErrorKind::NotFound => 404,
            // 409 Conflict - lifecycle, concurrency and integrity errors
            ErrorKind::InvalidState | ErrorKind::ConcurrentModification | ErrorKind::Constraint => {
                409
            }
            // 422 Unprocessable - the entry is well-formed but cannot post
            ErrorKind::UnbalancedEntry => 422,
            // 500 Internal Server Error
            ErrorKind::Internal => 500,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// The engine never retries on its own; this is a hint for callers.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::InvalidState => Self::InvalidState(message),
            ErrorKind::UnbalancedEntry => Self::UnbalancedEntry(message),
            ErrorKind::ConcurrentModification => Self::ConcurrentModification(message),
            ErrorKind::Constraint => Self::Constraint(message),
            ErrorKind::Internal => match err {
                LedgerError::Database(_) => Self::Database(message),
                _ => Self::Internal(message),
            },
        }
    }
}
