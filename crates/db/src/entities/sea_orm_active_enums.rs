//! Database enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Split policy for a group expense.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "split_policy")]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Equal split across all slots.
    #[sea_orm(string_value = "equal")]
    Equal,
    /// Owner keeps a chosen share, the rest is divided.
    #[sea_orm(string_value = "percentage")]
    Percentage,
}

/// Payment method for a contribution.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Bank transfer.
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    /// GCash e-wallet.
    #[sea_orm(string_value = "gcash")]
    Gcash,
    /// PayMaya e-wallet.
    #[sea_orm(string_value = "paymaya")]
    Paymaya,
    /// Credit card.
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
}

impl From<wais_core::split::PaymentMethod> for PaymentMethod {
    fn from(method: wais_core::split::PaymentMethod) -> Self {
        use wais_core::split::PaymentMethod as Core;
        match method {
            Core::Cash => Self::Cash,
            Core::BankTransfer => Self::BankTransfer,
            Core::Gcash => Self::Gcash,
            Core::Paymaya => Self::Paymaya,
            Core::CreditCard => Self::CreditCard,
        }
    }
}

impl From<PaymentMethod> for wais_core::split::PaymentMethod {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::BankTransfer => Self::BankTransfer,
            PaymentMethod::Gcash => Self::Gcash,
            PaymentMethod::Paymaya => Self::Paymaya,
            PaymentMethod::CreditCard => Self::CreditCard,
        }
    }
}
