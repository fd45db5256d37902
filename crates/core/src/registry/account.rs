//! Chart of accounts rules.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use super::Availability;
use crate::error::{EntityKind, LedgerError, LedgerResult};

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

/// Side on which an account's balance grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Asset and Expense accounts.
    Debit,
    /// Liability, Equity and Revenue accounts.
    Credit,
}

impl AccountType {
    /// All account types.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Stored/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
        }
    }

    /// Returns the normal balance side.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Calculates the balance change for the given debit and credit totals.
    ///
    /// - Asset/Expense: balance += debit - credit
    /// - Liability/Equity/Revenue: balance += credit - debit
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self.normal_balance() {
            NormalBalance::Debit => debit - credit,
            NormalBalance::Credit => credit - debit,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LedgerError::invalid_field("account_type", format!("unknown type '{s}'")))
    }
}

/// Information about an account needed for validation.
#[derive(Debug, Clone, Copy)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// The account type.
    pub account_type: AccountType,
    /// Active / deleted flags at the time of lookup.
    pub availability: Availability,
}

impl AccountInfo {
    /// Ensures the account can receive journal lines.
    pub fn ensure_usable(&self) -> LedgerResult<()> {
        self.availability
            .check(EntityKind::Account, self.id.into_inner())
    }
}

/// Rejects placing `account_id` under `new_parent` if that creates a cycle.
///
/// Walks from the proposed parent up through stored parent links; the move
/// is invalid if the walk reaches the account being moved. `parent_of`
/// returns the stored parent of an account, `None` for roots and unknown ids.
pub fn ensure_acyclic<F>(account_id: AccountId, new_parent: AccountId, mut parent_of: F) -> LedgerResult<()>
where
    F: FnMut(AccountId) -> Option<AccountId>,
{
    let cycle = || LedgerError::AccountCycle {
        account_id: account_id.into_inner(),
        parent_id: new_parent.into_inner(),
    };

    let mut visited = HashSet::new();
    let mut current = Some(new_parent);
    while let Some(node) = current {
        if node == account_id {
            return Err(cycle());
        }
        // Stored data already contains a loop not involving this account.
        if !visited.insert(node) {
            return Err(cycle());
        }
        current = parent_of(node);
    }
    Ok(())
}
