//! Loan domain types and the typed results of the payment engine.

use chrono::{DateTime, Utc};
use ledgerly_shared::types::YearMonth;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How a provider's payments are settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Each payment is toggled on its own.
    PerItem,
    /// All payments due in a month are paid together, in month order.
    ConsolidatedMonthly,
}

impl PaymentMode {
    /// Returns the string representation of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerItem => "per_item",
            Self::ConsolidatedMonthly => "consolidated_monthly",
        }
    }

    /// Parses a mode from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "per_item" => Some(Self::PerItem),
            "consolidated_monthly" => Some(Self::ConsolidatedMonthly),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled payment, reduced to what sequencing needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentRow {
    /// Month the payment is due.
    pub month: YearMonth,
    /// Paid flag.
    pub is_paid: bool,
    /// Amount in minor units.
    pub amount_minor: i64,
}

/// Aggregate of every payment a provider has due in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthStatus {
    /// The month.
    pub month: YearMonth,
    /// Number of payments due.
    pub payment_count: usize,
    /// Number of those already paid.
    pub paid_count: usize,
    /// Sum of all payments, minor units.
    pub total_minor: i64,
    /// Sum of paid payments, minor units.
    pub paid_minor: i64,
}

impl MonthStatus {
    /// Empty status for `month`.
    #[must_use]
    pub const fn empty(month: YearMonth) -> Self {
        Self {
            month,
            payment_count: 0,
            paid_count: 0,
            total_minor: 0,
            paid_minor: 0,
        }
    }

    /// Whether any payment of the month is unpaid.
    #[must_use]
    pub const fn has_unpaid(&self) -> bool {
        self.paid_count < self.payment_count
    }

    /// Whether any payment of the month is paid.
    #[must_use]
    pub const fn has_paid(&self) -> bool {
        self.paid_count > 0
    }

    /// Whether every payment of the month is paid.
    #[must_use]
    pub const fn is_fully_paid(&self) -> bool {
        self.payment_count > 0 && self.paid_count == self.payment_count
    }

    /// Sum of unpaid payments, minor units.
    #[must_use]
    pub const fn unpaid_minor(&self) -> i64 {
        self.total_minor - self.paid_minor
    }
}

/// A payment to create when a loan is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledPayment {
    /// Month the payment is due.
    pub month: YearMonth,
    /// Amount in minor units.
    pub amount_minor: i64,
}

/// Result of paying one consolidated month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayMonthResult {
    /// The month paid.
    pub month: YearMonth,
    /// Number of payments marked paid.
    pub paid_count: usize,
    /// Sum of those payments, minor units.
    pub total_amount_minor: i64,
    /// When they were marked paid.
    pub paid_at: DateTime<Utc>,
    /// The new earliest unpaid month, if any remain.
    pub next_payable_month: Option<YearMonth>,
}

/// Result of paying a contiguous range of consolidated months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayRangeResult {
    /// Months paid, in order.
    pub months_paid: Vec<YearMonth>,
    /// Number of payments marked paid across all months.
    pub paid_count: usize,
    /// Sum of those payments, minor units.
    pub total_amount_minor: i64,
    /// When they were marked paid.
    pub paid_at: DateTime<Utc>,
    /// The new earliest unpaid month, if any remain.
    pub next_payable_month: Option<YearMonth>,
}

/// Result of unpaying the latest paid consolidated month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpayMonthResult {
    /// The month unpaid.
    pub month: YearMonth,
    /// Number of payments marked unpaid.
    pub unpaid_count: usize,
    /// Sum of those payments, minor units.
    pub total_amount_minor: i64,
    /// The paid month immediately before, if any.
    pub previous_payable: Option<YearMonth>,
}

/// Month-by-month payment overview for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderPaymentStatus {
    /// The provider.
    pub provider_id: Uuid,
    /// Payment mode of the provider.
    pub payment_mode: PaymentMode,
    /// Every month with payments, in order.
    pub months: Vec<MonthStatus>,
    /// Earliest month with an unpaid payment.
    pub next_payable_month: Option<YearMonth>,
    /// Latest month with a paid payment.
    pub latest_paid_month: Option<YearMonth>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_mode_round_trip_strings() {
        for mode in [PaymentMode::PerItem, PaymentMode::ConsolidatedMonthly] {
            assert_eq!(PaymentMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(PaymentMode::parse("weekly"), None);
    }

    #[test]
    fn test_month_status_flags() {
        let month = YearMonth::new(2026, 1).unwrap();
        let status = MonthStatus {
            month,
            payment_count: 2,
            paid_count: 1,
            total_minor: 300,
            paid_minor: 100,
        };
        assert!(status.has_unpaid());
        assert!(status.has_paid());
        assert!(!status.is_fully_paid());
        assert_eq!(status.unpaid_minor(), 200);
        assert!(!MonthStatus::empty(month).is_fully_paid());
    }
}
