//! String-backed enums stored on entity columns, with conversions to the
//! core domain enums.

use ledgerly_core::{ledger, loan};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored entry direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money coming in.
    #[sea_orm(string_value = "income")]
    Income,
    /// Money going out.
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Account-to-account movement.
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

/// Stored entry origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Entered by the user.
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Generated from a recurring template.
    #[sea_orm(string_value = "recurring")]
    Recurring,
    /// Generated from a loan schedule.
    #[sea_orm(string_value = "loan")]
    Loan,
}

/// Stored settlement intent of a CC entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum SettlementIntent {
    /// Pay off this billing cycle.
    #[sea_orm(string_value = "immediate")]
    Immediate,
    /// Carry to a later cycle.
    #[sea_orm(string_value = "deferred")]
    Deferred,
}

/// Stored payment mode of a loan provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Each payment toggled on its own.
    #[sea_orm(string_value = "per_item")]
    PerItem,
    /// Whole months paid together, in order.
    #[sea_orm(string_value = "consolidated_monthly")]
    ConsolidatedMonthly,
}

impl From<ledger::EntryType> for EntryType {
    fn from(value: ledger::EntryType) -> Self {
        match value {
            ledger::EntryType::Income => Self::Income,
            ledger::EntryType::Expense => Self::Expense,
            ledger::EntryType::Transfer => Self::Transfer,
        }
    }
}

impl From<EntryType> for ledger::EntryType {
    fn from(value: EntryType) -> Self {
        match value {
            EntryType::Income => Self::Income,
            EntryType::Expense => Self::Expense,
            EntryType::Transfer => Self::Transfer,
        }
    }
}

impl From<ledger::EntrySource> for EntrySource {
    fn from(value: ledger::EntrySource) -> Self {
        match value {
            ledger::EntrySource::Manual => Self::Manual,
            ledger::EntrySource::Recurring => Self::Recurring,
            ledger::EntrySource::Loan => Self::Loan,
        }
    }
}

impl From<ledger::SettlementIntent> for SettlementIntent {
    fn from(value: ledger::SettlementIntent) -> Self {
        match value {
            ledger::SettlementIntent::Immediate => Self::Immediate,
            ledger::SettlementIntent::Deferred => Self::Deferred,
        }
    }
}

impl From<SettlementIntent> for ledger::SettlementIntent {
    fn from(value: SettlementIntent) -> Self {
        match value {
            SettlementIntent::Immediate => Self::Immediate,
            SettlementIntent::Deferred => Self::Deferred,
        }
    }
}

impl From<loan::PaymentMode> for PaymentMode {
    fn from(value: loan::PaymentMode) -> Self {
        match value {
            loan::PaymentMode::PerItem => Self::PerItem,
            loan::PaymentMode::ConsolidatedMonthly => Self::ConsolidatedMonthly,
        }
    }
}

impl From<PaymentMode> for loan::PaymentMode {
    fn from(value: PaymentMode) -> Self {
        match value {
            PaymentMode::PerItem => Self::PerItem,
            PaymentMode::ConsolidatedMonthly => Self::ConsolidatedMonthly,
        }
    }
}
