//! Domain types for inventory movements.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{ItemId, WarehouseId};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};

/// Number of fractional digits a quantity may carry.
pub const QUANTITY_SCALE: u32 = 3;

/// Inventory transaction type.
///
/// The type alone determines the sign of a movement; stored quantities are
/// always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Goods received (+).
    ReceiveStock,
    /// Goods issued (-).
    IssueStock,
    /// Manual upward adjustment (+).
    AdjustStockIn,
    /// Manual downward adjustment (-).
    AdjustStockOut,
    /// Outbound leg of a transfer (-).
    TransferOut,
    /// Inbound leg of a transfer (+).
    TransferIn,
}

impl TransactionType {
    /// All transaction types.
    pub const ALL: [Self; 6] = [
        Self::ReceiveStock,
        Self::IssueStock,
        Self::AdjustStockIn,
        Self::AdjustStockOut,
        Self::TransferOut,
        Self::TransferIn,
    ];

    /// Stored/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReceiveStock => "RECEIVE_STOCK",
            Self::IssueStock => "ISSUE_STOCK",
            Self::AdjustStockIn => "ADJUST_STOCK_IN",
            Self::AdjustStockOut => "ADJUST_STOCK_OUT",
            Self::TransferOut => "TRANSFER_OUT",
            Self::TransferIn => "TRANSFER_IN",
        }
    }

    /// True for types that increase on-hand quantity.
    #[must_use]
    pub const fn is_inbound(self) -> bool {
        matches!(self, Self::ReceiveStock | Self::AdjustStockIn | Self::TransferIn)
    }

    /// `+1` for inbound types, `-1` for outbound types.
    #[must_use]
    pub const fn sign(self) -> Decimal {
        if self.is_inbound() {
            Decimal::ONE
        } else {
            Decimal::NEGATIVE_ONE
        }
    }

    /// Signed effect of moving `quantity` units with this type.
    #[must_use]
    pub fn signed(self, quantity: Decimal) -> Decimal {
        self.sign() * quantity
    }

    /// The type that exactly cancels this one.
    #[must_use]
    pub const fn counter(self) -> Self {
        match self {
            Self::ReceiveStock => Self::IssueStock,
            Self::IssueStock => Self::ReceiveStock,
            Self::AdjustStockIn => Self::AdjustStockOut,
            Self::AdjustStockOut => Self::AdjustStockIn,
            Self::TransferOut => Self::TransferIn,
            Self::TransferIn => Self::TransferOut,
        }
    }

    /// True for the two transfer legs.
    #[must_use]
    pub const fn is_transfer(self) -> bool {
        matches!(self, Self::TransferOut | Self::TransferIn)
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LedgerError::invalid_field("transaction_type", format!("unknown type '{s}'")))
    }
}

/// Direction of a manual adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    /// Increase stock.
    In,
    /// Decrease stock.
    Out,
}

impl AdjustmentDirection {
    /// Transaction type recorded for this direction.
    #[must_use]
    pub const fn transaction_type(self) -> TransactionType {
        match self {
            Self::In => TransactionType::AdjustStockIn,
            Self::Out => TransactionType::AdjustStockOut,
        }
    }
}

/// Strictly positive quantity with at most [`QUANTITY_SCALE`] decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Validates a raw quantity.
    ///
    /// # Errors
    ///
    /// `NonPositiveQuantity` for zero or negative values, `QuantityPrecision`
    /// if more than three significant fractional digits are present.
    pub fn new(value: Decimal) -> LedgerResult<Self> {
        if value <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveQuantity(value));
        }
        if value.round_dp(QUANTITY_SCALE) != value {
            return Err(LedgerError::QuantityPrecision(value));
        }
        Ok(Self(value.normalize()))
    }

    /// The validated value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

/// Request to record a single movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTransactionInput {
    /// Item moved.
    pub item_id: ItemId,
    /// Warehouse affected.
    pub warehouse_id: WarehouseId,
    /// Raw quantity, validated into a [`Quantity`].
    pub quantity: Decimal,
    /// Movement type.
    pub transaction_type: TransactionType,
    /// Optional link to a source document or related transaction.
    pub reference_id: Option<Uuid>,
    /// Business date; the server clock is used when absent.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Request to record a manual adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentInput {
    /// Item adjusted.
    pub item_id: ItemId,
    /// Warehouse affected.
    pub warehouse_id: WarehouseId,
    /// Raw quantity.
    pub quantity: Decimal,
    /// Up or down.
    pub direction: AdjustmentDirection,
    /// Free-text notes (e.g. stock count reference).
    pub notes: Option<String>,
}

/// Request to move stock between two warehouses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferInput {
    /// Item moved.
    pub item_id: ItemId,
    /// Source warehouse.
    pub from_warehouse_id: WarehouseId,
    /// Destination warehouse.
    pub to_warehouse_id: WarehouseId,
    /// Raw quantity.
    pub quantity: Decimal,
    /// Business date; the server clock is used when absent.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// A validated movement ready to be appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryTransaction {
    /// Item moved.
    pub item_id: ItemId,
    /// Warehouse affected.
    pub warehouse_id: WarehouseId,
    /// Validated quantity.
    pub quantity: Quantity,
    /// Movement type.
    pub transaction_type: TransactionType,
    /// Optional reference.
    pub reference_id: Option<Uuid>,
    /// Business date.
    pub transaction_date: DateTime<Utc>,
    /// Free-text notes.
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[rstest]
    #[case(TransactionType::ReceiveStock, dec!(1))]
    #[case(TransactionType::IssueStock, dec!(-1))]
    #[case(TransactionType::AdjustStockIn, dec!(1))]
    #[case(TransactionType::AdjustStockOut, dec!(-1))]
    #[case(TransactionType::TransferIn, dec!(1))]
    #[case(TransactionType::TransferOut, dec!(-1))]
    fn test_signed_effect_table(#[case] transaction_type: TransactionType, #[case] sign: Decimal) {
        assert_eq!(transaction_type.sign(), sign);
        assert_eq!(transaction_type.signed(dec!(2.5)), sign * dec!(2.5));
    }

    #[test]
    fn test_counter_cancels() {
        for t in TransactionType::ALL {
            assert_eq!(t.signed(dec!(7)) + t.counter().signed(dec!(7)), Decimal::ZERO);
            assert_eq!(t.counter().counter(), t);
            assert_eq!(t.counter().is_transfer(), t.is_transfer());
        }
    }

    #[test]
    fn test_transaction_type_parse() {
        assert_eq!(
            TransactionType::from_str("receive_stock").unwrap(),
            TransactionType::ReceiveStock
        );
        assert!(TransactionType::from_str("SHIP").is_err());
    }

    #[test]
    fn test_adjustment_direction_mapping() {
        assert_eq!(AdjustmentDirection::In.transaction_type(), TransactionType::AdjustStockIn);
        assert_eq!(AdjustmentDirection::Out.transaction_type(), TransactionType::AdjustStockOut);
    }

    #[rstest]
    #[case(dec!(1))]
    #[case(dec!(0.001))]
    #[case(dec!(12.345))]
    #[case(dec!(12.3400))]
    fn test_quantity_accepts(#[case] value: Decimal) {
        assert_eq!(Quantity::new(value).unwrap().value(), value);
    }

    #[test]
    fn test_quantity_rejects() {
        assert!(matches!(
            Quantity::new(dec!(0)),
            Err(LedgerError::NonPositiveQuantity(_))
        ));
        assert!(matches!(
            Quantity::new(dec!(-3)),
            Err(LedgerError::NonPositiveQuantity(_))
        ));
        assert!(matches!(
            Quantity::new(dec!(1.0005)),
            Err(LedgerError::QuantityPrecision(_))
        ));
    }
}
