//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g. dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "USD", "IDR").
    pub currency: CurrencyCode,
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Error returned when a string is not a three-letter currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code '{0}': expected three ASCII letters")]
pub struct InvalidCurrencyCode(pub String);

/// ISO 4217 shaped currency code.
///
/// Any three ASCII letters are accepted and normalized to upper case; the
/// ledger does not maintain a currency catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// US Dollar.
    pub const USD: Self = Self(*b"USD");
    /// Euro.
    pub const EUR: Self = Self(*b"EUR");
    /// Indonesian Rupiah.
    pub const IDR: Self = Self(*b"IDR");

    /// Parses and normalizes a currency code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrencyCode` unless `code` is exactly three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, InvalidCurrencyCode> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(InvalidCurrencyCode(code.to_string()));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_new() {
        let amount = dec!(100.00);
        let money = Money::new(amount, CurrencyCode::USD);
        assert_eq!(money.amount, amount);
        assert_eq!(money.currency, CurrencyCode::USD);
        assert!(money.is_positive());
    }

    #[test]
    fn test_money_zero() {
        let money = Money::zero(CurrencyCode::IDR);
        assert!(money.is_zero());
        assert!(!money.is_positive());
        assert_eq!(money.amount, Decimal::ZERO);
    }

    #[test]
    fn test_money_display() {
        let money = Money::new(dec!(12.50), CurrencyCode::EUR);
        assert_eq!(money.to_string(), "12.50 EUR");
    }

    #[rstest]
    #[case("USD", "USD")]
    #[case("usd", "USD")]
    #[case("GbP", "GBP")]
    #[case("JPY", "JPY")]
    fn test_currency_parse_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(CurrencyCode::parse(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("US")]
    #[case("USDT")]
    #[case("U5D")]
    #[case("ÜSD")]
    fn test_currency_parse_rejects(#[case] input: &str) {
        assert_eq!(
            CurrencyCode::parse(input),
            Err(InvalidCurrencyCode(input.to_string()))
        );
    }

    #[test]
    fn test_currency_ordering_is_alphabetic() {
        let mut codes = vec![CurrencyCode::USD, CurrencyCode::EUR, CurrencyCode::IDR];
        codes.sort();
        assert_eq!(codes, vec![CurrencyCode::EUR, CurrencyCode::IDR, CurrencyCode::USD]);
    }
}
