//! String-backed enums stored in the database, with conversions to the
//! domain enums of `tally-core`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::inventory::TransactionType as CoreTransactionType;
use tally_core::journal::EntryStatus as CoreEntryStatus;
use tally_core::registry::{
    AccountType as CoreAccountType, ItemType as CoreItemType, ValuationMethod as CoreValuationMethod,
};

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AccountType {
    #[sea_orm(string_value = "ASSET")]
    Asset,
    #[sea_orm(string_value = "LIABILITY")]
    Liability,
    #[sea_orm(string_value = "EQUITY")]
    Equity,
    #[sea_orm(string_value = "REVENUE")]
    Revenue,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

/// Item classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ItemType {
    #[sea_orm(string_value = "RAW_MATERIAL")]
    RawMaterial,
    #[sea_orm(string_value = "FINISHED_GOOD")]
    FinishedGood,
    #[sea_orm(string_value = "WIP")]
    Wip,
    #[sea_orm(string_value = "NON_INVENTORY")]
    NonInventory,
}

/// Inventory valuation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ValuationMethod {
    #[sea_orm(string_value = "FIFO")]
    Fifo,
    #[sea_orm(string_value = "LIFO")]
    Lifo,
    #[sea_orm(string_value = "WEIGHTED_AVERAGE")]
    WeightedAverage,
}

/// Journal entry lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum EntryStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "POSTED")]
    Posted,
    #[sea_orm(string_value = "VOIDED")]
    Voided,
}

/// Inventory transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TransactionType {
    #[sea_orm(string_value = "RECEIVE_STOCK")]
    ReceiveStock,
    #[sea_orm(string_value = "ISSUE_STOCK")]
    IssueStock,
    #[sea_orm(string_value = "ADJUST_STOCK_IN")]
    AdjustStockIn,
    #[sea_orm(string_value = "ADJUST_STOCK_OUT")]
    AdjustStockOut,
    #[sea_orm(string_value = "TRANSFER_OUT")]
    TransferOut,
    #[sea_orm(string_value = "TRANSFER_IN")]
    TransferIn,
}

/// Two-way mapping between a stored enum and its domain counterpart.
macro_rules! map_enum {
    ($db:ident <=> $core:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }
    };
}

map_enum!(AccountType <=> CoreAccountType { Asset, Liability, Equity, Revenue, Expense });
map_enum!(ItemType <=> CoreItemType { RawMaterial, FinishedGood, Wip, NonInventory });
map_enum!(ValuationMethod <=> CoreValuationMethod { Fifo, Lifo, WeightedAverage });
map_enum!(EntryStatus <=> CoreEntryStatus { Draft, Posted, Voided });
map_enum!(TransactionType <=> CoreTransactionType {
    ReceiveStock,
    IssueStock,
    AdjustStockIn,
    AdjustStockOut,
    TransferOut,
    TransferIn,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_values_match_domain() {
        for t in CoreTransactionType::ALL {
            assert_eq!(TransactionType::from(t).to_value(), t.as_str());
        }
        for t in CoreAccountType::ALL {
            assert_eq!(AccountType::from(t).to_value(), t.as_str());
        }
        for t in CoreItemType::ALL {
            assert_eq!(ItemType::from(t).to_value(), t.as_str());
        }
        assert_eq!(EntryStatus::from(CoreEntryStatus::Posted).to_value(), "POSTED");
    }
}
