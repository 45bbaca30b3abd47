//! Domain types for ledger entries and the credit-card lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::LedgerError;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
    /// Account-to-account movement (e.g., paying off a credit card).
    Transfer,
}

impl EntryType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Entered by the user.
    Manual,
    /// Generated from a recurring template.
    Recurring,
    /// Generated from a loan payment schedule.
    Loan,
}

impl EntrySource {
    /// Returns the string representation of the source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Recurring => "recurring",
            Self::Loan => "loan",
        }
    }
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a credit-card charge is paid off this billing cycle or later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementIntent {
    /// Pay off within the current billing cycle.
    Immediate,
    /// Carry the balance forward.
    Deferred,
}

impl SettlementIntent {
    /// Returns the string representation of the intent.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Deferred => "deferred",
        }
    }

    /// Parses an intent, rejecting anything but `immediate` or `deferred`.
    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "immediate" => Ok(Self::Immediate),
            "deferred" => Ok(Self::Deferred),
            other => Err(LedgerError::InvalidSettlementIntent(other.to_string())),
        }
    }
}

impl fmt::Display for SettlementIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a credit-card entry.
///
/// Never stored. Always derived from `is_paid` and `billed_at`:
/// - Pending → Billed (toggle billed)
/// - Billed → Pending (toggle billed)
/// - Pending | Billed → Settled (atomic settlement only)
///
/// Settled is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CcState {
    /// Charged, not yet on a statement.
    Pending,
    /// On a statement, not yet paid.
    Billed,
    /// Paid off.
    Settled,
}

impl CcState {
    /// Derives the state from the stored columns.
    #[must_use]
    pub const fn from_parts(is_paid: bool, billed_at: Option<DateTime<Utc>>) -> Self {
        if is_paid {
            Self::Settled
        } else if billed_at.is_some() {
            Self::Billed
        } else {
            Self::Pending
        }
    }

    /// Returns the string representation of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Billed => "billed",
            Self::Settled => "settled",
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Settled)
    }
}

impl fmt::Display for CcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The CC-relevant columns of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcSnapshot {
    /// Whether the entry is a credit-card charge.
    pub is_cc_payment: bool,
    /// Stored settlement intent.
    pub settlement_intent: Option<SettlementIntent>,
    /// Paid flag.
    pub is_paid: bool,
    /// When the charge was billed.
    pub billed_at: Option<DateTime<Utc>>,
}

impl CcSnapshot {
    /// Derived lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CcState {
        CcState::from_parts(self.is_paid, self.billed_at)
    }
}

/// Outcome of a billed toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CcTransition {
    /// State before the toggle.
    pub from: CcState,
    /// State after the toggle.
    pub to: CcState,
    /// Value to store in `billed_at`.
    pub billed_at: Option<DateTime<Utc>>,
}

/// Resolved CC columns for a new or updated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcFields {
    /// Whether the entry is a credit-card charge.
    pub is_cc_payment: bool,
    /// Intent, present exactly when `is_cc_payment`.
    pub settlement_intent: Option<SettlementIntent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("income", Some(EntryType::Income))]
    #[case("EXPENSE", Some(EntryType::Expense))]
    #[case("transfer", Some(EntryType::Transfer))]
    #[case("refund", None)]
    fn test_entry_type_parse(#[case] input: &str, #[case] expected: Option<EntryType>) {
        assert_eq!(EntryType::parse(input), expected);
    }

    #[test]
    fn test_settlement_intent_parse() {
        assert_eq!(
            SettlementIntent::parse("immediate").unwrap(),
            SettlementIntent::Immediate
        );
        assert_eq!(
            SettlementIntent::parse("deferred").unwrap(),
            SettlementIntent::Deferred
        );
        assert!(matches!(
            SettlementIntent::parse("later"),
            Err(LedgerError::InvalidSettlementIntent(v)) if v == "later"
        ));
    }

    #[test]
    fn test_cc_state_from_parts() {
        let now = Utc::now();
        assert_eq!(CcState::from_parts(false, None), CcState::Pending);
        assert_eq!(CcState::from_parts(false, Some(now)), CcState::Billed);
        assert_eq!(CcState::from_parts(true, None), CcState::Settled);
        assert_eq!(CcState::from_parts(true, Some(now)), CcState::Settled);
        assert!(CcState::Settled.is_terminal());
        assert!(!CcState::Billed.is_terminal());
    }
}
