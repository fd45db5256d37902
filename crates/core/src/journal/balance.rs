//! Balance calculations.
//!
//! An entry is balanced when, for every currency it touches, the sum of
//! debit amounts equals the sum of credit amounts. Currencies are never
//! netted against each other.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CurrencyCode};

use super::types::JournalLine;
use crate::error::{LedgerError, LedgerResult};
use crate::registry::AccountType;

/// Debit and credit totals for one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    /// The currency.
    pub currency: CurrencyCode,
    /// Sum of debit amounts.
    pub debit: Decimal,
    /// Sum of credit amounts.
    pub credit: Decimal,
}

impl CurrencyTotals {
    /// True if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }

    /// Debit minus credit.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Totals grouped by currency, ordered by currency code.
#[must_use]
pub fn totals_by_currency(lines: &[JournalLine]) -> Vec<CurrencyTotals> {
    let mut groups: BTreeMap<CurrencyCode, (Decimal, Decimal)> = BTreeMap::new();
    for line in lines {
        let (debit, credit) = groups.entry(line.amount.currency).or_default();
        if line.is_debit {
            *debit += line.amount.amount;
        } else {
            *credit += line.amount.amount;
        }
    }

    groups
        .into_iter()
        .map(|(currency, (debit, credit))| CurrencyTotals {
            currency,
            debit,
            credit,
        })
        .collect()
}

/// Checks the balance invariant.
///
/// Returns the per-currency totals on success, or `UnbalancedEntry` for the
/// first (by currency code) group that does not balance.
pub fn ensure_balanced(lines: &[JournalLine]) -> LedgerResult<Vec<CurrencyTotals>> {
    let totals = totals_by_currency(lines);
    if let Some(unbalanced) = totals.iter().find(|t| !t.is_balanced()) {
        return Err(LedgerError::UnbalancedEntry {
            currency: unbalanced.currency,
            debit: unbalanced.debit,
            credit: unbalanced.credit,
        });
    }
    Ok(totals)
}

/// Account balance in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Currency of the totals.
    pub currency: CurrencyCode,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance, signed by the account's normal side.
    pub balance: Decimal,
}

/// Folds posted line amounts `(currency, amount, is_debit)` into per-currency balances.
#[must_use]
pub fn account_balances<I>(account_id: AccountId, account_type: AccountType, lines: I) -> Vec<AccountBalance>
where
    I: IntoIterator<Item = (CurrencyCode, Decimal, bool)>,
{
    let mut groups: BTreeMap<CurrencyCode, (Decimal, Decimal)> = BTreeMap::new();
    for (currency, amount, is_debit) in lines {
        let (debit, credit) = groups.entry(currency).or_default();
        if is_debit {
            *debit += amount;
        } else {
            *credit += amount;
        }
    }

    groups
        .into_iter()
        .map(|(currency, (debit_total, credit_total))| AccountBalance {
            account_id,
            currency,
            debit_total,
            credit_total,
            balance: account_type.balance_change(debit_total, credit_total),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::Money;

    fn line(no: u32, amount: Decimal, currency: CurrencyCode, is_debit: bool) -> JournalLine {
        JournalLine {
            line_no: no,
            account_id: AccountId::new(),
            amount: Money::new(amount, currency),
            is_debit,
            memo: None,
        }
    }

    #[test]
    fn test_balanced_single_currency() {
        let lines = vec![
            line(1, dec!(100.00), CurrencyCode::USD, true),
            line(2, dec!(60.00), CurrencyCode::USD, false),
            line(3, dec!(40.00), CurrencyCode::USD, false),
        ];
        let totals = ensure_balanced(&lines).unwrap();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].debit, dec!(100.00));
        assert_eq!(totals[0].credit, dec!(100.00));
    }

    #[test]
    fn test_unbalanced_reports_currency_and_totals() {
        let lines = vec![
            line(1, dec!(100.00), CurrencyCode::USD, true),
            line(2, dec!(90.00), CurrencyCode::USD, false),
        ];
        let err = ensure_balanced(&lines).unwrap_err();
        match err {
            LedgerError::UnbalancedEntry {
                currency,
                debit,
                credit,
            } => {
                assert_eq!(currency, CurrencyCode::USD);
                assert_eq!(debit, dec!(100.00));
                assert_eq!(credit, dec!(90.00));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_currencies_are_not_netted() {
        // Same numeric totals overall, but each currency is one-sided.
        let lines = vec![
            line(1, dec!(50), CurrencyCode::USD, true),
            line(2, dec!(50), CurrencyCode::EUR, false),
        ];
        let err = ensure_balanced(&lines).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::UnbalancedEntry { currency, .. } if currency == CurrencyCode::EUR
        ));
    }

    #[test]
    fn test_multi_currency_balanced_per_group() {
        let lines = vec![
            line(1, dec!(50), CurrencyCode::USD, true),
            line(2, dec!(50), CurrencyCode::USD, false),
            line(3, dec!(700000), CurrencyCode::IDR, true),
            line(4, dec!(700000), CurrencyCode::IDR, false),
        ];
        let totals = ensure_balanced(&lines).unwrap();
        let currencies: Vec<_> = totals.iter().map(|t| t.currency).collect();
        assert_eq!(currencies, vec![CurrencyCode::IDR, CurrencyCode::USD]);
        assert!(totals.iter().all(|t| t.difference().is_zero()));
    }

    #[test]
    fn test_account_balances_by_normal_side() {
        let id = AccountId::new();
        let lines = vec![
            (CurrencyCode::USD, dec!(100), true),
            (CurrencyCode::USD, dec!(30), false),
            (CurrencyCode::EUR, dec!(10), false),
        ];

        let asset = account_balances(id, AccountType::Asset, lines.clone());
        assert_eq!(asset.len(), 2);
        assert_eq!(asset[0].currency, CurrencyCode::EUR);
        assert_eq!(asset[0].balance, dec!(-10));
        assert_eq!(asset[1].balance, dec!(70));

        let revenue = account_balances(id, AccountType::Revenue, lines);
        assert_eq!(revenue[1].balance, dec!(-70));
        assert_eq!(revenue[1].debit_total, dec!(100));
        assert_eq!(revenue[1].credit_total, dec!(30));
    }
}
