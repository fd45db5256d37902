//! Reference registries: chart of accounts, items and warehouses.
//!
//! Registry records are referenced by journal lines and inventory
//! transactions. Whether a record may be referenced is decided at the time
//! of use from its [`Availability`], never cached from creation time.

pub mod account;
pub mod item;
pub mod warehouse;

use uuid::Uuid;

use crate::error::{EntityKind, LedgerError, LedgerResult, Unusable};

pub use account::{AccountInfo, AccountType, NormalBalance, ensure_acyclic};
pub use item::{ItemInfo, ItemType, ValuationMethod, validate_prices};
pub use warehouse::WarehouseInfo;

/// Maximum length of a registry code (account code, SKU, warehouse code).
pub const MAX_CODE_LEN: usize = 50;

/// Maximum length of a display name.
pub const MAX_NAME_LEN: usize = 255;

/// Lifecycle flags shared by all registry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    /// Record has not been deactivated.
    pub is_active: bool,
    /// Record carries a soft-delete marker.
    pub is_deleted: bool,
}

impl Availability {
    /// An active, not deleted record.
    pub const ACTIVE: Self = Self {
        is_active: true,
        is_deleted: false,
    };

    /// Creates availability flags.
    #[must_use]
    pub const fn new(is_active: bool, is_deleted: bool) -> Self {
        Self {
            is_active,
            is_deleted,
        }
    }

    /// Ensures the record may be referenced by new ledger rows.
    ///
    /// Deletion wins over deactivation when both apply.
    pub fn check(self, kind: EntityKind, id: Uuid) -> LedgerResult<()> {
        let reason = if self.is_deleted {
            Unusable::Deleted
        } else if !self.is_active {
            Unusable::Inactive
        } else {
            return Ok(());
        };
        Err(LedgerError::UnusableReference { kind, id, reason })
    }
}

/// Ensures a looked-up reference exists and is usable.
pub fn ensure_usable(
    kind: EntityKind,
    id: Uuid,
    availability: Option<Availability>,
) -> LedgerResult<()> {
    match availability {
        Some(availability) => availability.check(kind, id),
        None => Err(LedgerError::UnusableReference {
            kind,
            id,
            reason: Unusable::Missing,
        }),
    }
}

/// Trims a code and checks it is non-empty, bounded, and has no inner whitespace.
pub fn normalize_code(field: &'static str, raw: &str) -> LedgerResult<String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(LedgerError::invalid_field(field, "must not be empty"));
    }
    if code.chars().count() > MAX_CODE_LEN {
        return Err(LedgerError::invalid_field(
            field,
            format!("must be at most {MAX_CODE_LEN} characters"),
        ));
    }
    if code.chars().any(char::is_whitespace) {
        return Err(LedgerError::invalid_field(field, "must not contain whitespace"));
    }
    Ok(code.to_string())
}

/// Trims a display name and checks it is non-empty and bounded.
pub fn normalize_name(field: &'static str, raw: &str) -> LedgerResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid_field(field, "must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(LedgerError::invalid_field(
            field,
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Availability::new(true, false), None)]
    #[case(Availability::new(false, false), Some(Unusable::Inactive))]
    #[case(Availability::new(true, true), Some(Unusable::Deleted))]
    #[case(Availability::new(false, true), Some(Unusable::Deleted))]
    fn test_availability_check(#[case] availability: Availability, #[case] expected: Option<Unusable>) {
        let result = availability.check(EntityKind::Account, Uuid::nil());
        match expected {
            None => assert!(result.is_ok()),
            Some(reason) => assert!(matches!(
                result,
                Err(LedgerError::UnusableReference { reason: r, .. }) if r == reason
            )),
        }
    }

    #[test]
    fn test_missing_reference() {
        let err = ensure_usable(EntityKind::Warehouse, Uuid::nil(), None).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::UnusableReference {
                kind: EntityKind::Warehouse,
                reason: Unusable::Missing,
                ..
            }
        ));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("code", "  1000 ").unwrap(), "1000");
        assert!(normalize_code("code", "   ").is_err());
        assert!(normalize_code("code", "10 00").is_err());
        assert!(normalize_code("code", &"X".repeat(MAX_CODE_LEN + 1)).is_err());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("name", " Cash ").unwrap(), "Cash");
        assert!(normalize_name("name", "").is_err());
    }
}
