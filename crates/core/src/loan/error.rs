//! Loan payment error types.
//!
//! Sequencing errors carry the months involved so callers can tell the
//! user which month to pay or unpay instead.

use ledgerly_shared::types::YearMonth;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;

/// Errors that can occur during loan payment operations.
#[derive(Debug, Error)]
pub enum LoanPaymentError {
    // ========== Lookup Errors ==========
    /// Provider not found (or owned by another workspace).
    #[error("Loan provider not found: {0}")]
    ProviderNotFound(Uuid),

    /// Loan payment not found (or owned by another workspace).
    #[error("Loan payment not found: {0}")]
    PaymentNotFound(Uuid),

    // ========== Mode Errors ==========
    /// The operation needs a consolidated-monthly provider.
    #[error("Loan provider {0} is not in consolidated monthly mode")]
    ProviderNotConsolidated(Uuid),

    /// Individual toggles are not allowed on consolidated providers.
    #[error("Loan provider {0} is consolidated; pay whole months instead")]
    ConsolidatedRequiresMonthlyPayment(Uuid),

    // ========== Sequencing Errors ==========
    /// Every payment of the provider is already paid.
    #[error("No unpaid months remain")]
    NoUnpaidMonths,

    /// No payment of the provider is paid.
    #[error("No paid months to unpay")]
    NoPaidMonths,

    /// A later month was requested while an earlier one is outstanding.
    #[error("Must pay {expected} before {requested}")]
    MustPayEarlierMonth {
        /// The earliest unpaid month.
        expected: YearMonth,
        /// The month the caller asked for.
        requested: YearMonth,
    },

    /// Range end is not after its start.
    #[error("End month {end} must be after start month {start}")]
    EndMonthBeforeStart {
        /// Range start.
        start: YearMonth,
        /// Range end.
        end: YearMonth,
    },

    /// The range crosses a month with nothing to pay.
    #[error("Cannot skip month {skipped}: it has no unpaid payments")]
    CannotSkipMonth {
        /// The first month without unpaid payments.
        skipped: YearMonth,
    },

    /// An earlier month was requested while a later one is still paid.
    #[error("Cannot unpay {requested} while {latest} is paid")]
    CannotUnpayEarlierMonth {
        /// The latest paid month.
        latest: YearMonth,
        /// The month the caller asked for.
        requested: YearMonth,
    },

    /// Some payment ids do not belong to the provider/month.
    #[error("Payment ids do not match provider month: expected {expected}, matched {matched}")]
    PaymentIdsInvalid {
        /// Number of distinct ids supplied.
        expected: usize,
        /// Number of ids that matched.
        matched: usize,
    },

    // ========== Validation Errors ==========
    /// Too many payment ids in one call.
    #[error("Too many payments: maximum {max}, got {actual}")]
    BatchTooLarge {
        /// Maximum accepted.
        max: usize,
        /// Number supplied.
        actual: usize,
    },

    /// Cutoff day outside 1..=31.
    #[error("Cutoff day must be between 1 and 31, got {0}")]
    InvalidCutoffDay(u32),

    /// Loan term outside the accepted range.
    #[error("Loan term must be between 1 and {max} months, got {actual}")]
    InvalidTerm {
        /// Maximum term.
        max: u32,
        /// Requested term.
        actual: u32,
    },

    /// Amount must be strictly positive.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(i64),

    /// Amount exceeds the accepted maximum.
    #[error("Amount must be at most {max}, got {actual}")]
    AmountTooLarge {
        /// Maximum amount, minor units.
        max: i64,
        /// Requested amount.
        actual: i64,
    },

    /// A sum of payment amounts does not fit in 64 bits.
    #[error("Total amount is out of range")]
    TotalOverflow,

    /// Name must not be blank.
    #[error("Name cannot be empty")]
    EmptyName,

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LoanPaymentError {
    /// Taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProviderNotFound(_) | Self::PaymentNotFound(_) => ErrorKind::NotFound,
            Self::ProviderNotConsolidated(_)
            | Self::ConsolidatedRequiresMonthlyPayment(_)
            | Self::NoUnpaidMonths
            | Self::NoPaidMonths
            | Self::PaymentIdsInvalid { .. } => ErrorKind::StateConflict,
            Self::MustPayEarlierMonth { .. }
            | Self::EndMonthBeforeStart { .. }
            | Self::CannotSkipMonth { .. }
            | Self::CannotUnpayEarlierMonth { .. } => ErrorKind::SequentialOrderViolation,
            Self::BatchTooLarge { .. }
            | Self::InvalidCutoffDay(_)
            | Self::InvalidTerm { .. }
            | Self::NonPositiveAmount(_)
            | Self::AmountTooLarge { .. }
            | Self::TotalOverflow
            | Self::EmptyName => ErrorKind::Validation,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ProviderNotFound(_) => "LOAN_PROVIDER_NOT_FOUND",
            Self::PaymentNotFound(_) => "LOAN_PAYMENT_NOT_FOUND",
            Self::ProviderNotConsolidated(_) => "PROVIDER_NOT_CONSOLIDATED",
            Self::ConsolidatedRequiresMonthlyPayment(_) => "CONSOLIDATED_REQUIRES_MONTHLY_PAYMENT",
            Self::NoUnpaidMonths => "NO_UNPAID_MONTHS",
            Self::NoPaidMonths => "NO_PAID_MONTHS",
            Self::MustPayEarlierMonth { .. } => "MUST_PAY_EARLIER_MONTH",
            Self::EndMonthBeforeStart { .. } => "END_MONTH_BEFORE_START",
            Self::CannotSkipMonth { .. } => "CANNOT_SKIP_MONTH",
            Self::CannotUnpayEarlierMonth { .. } => "CANNOT_UNPAY_EARLIER_MONTH",
            Self::PaymentIdsInvalid { .. } => "PAYMENT_IDS_INVALID",
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            Self::InvalidCutoffDay(_) => "INVALID_CUTOFF_DAY",
            Self::InvalidTerm { .. } => "INVALID_TERM",
            Self::NonPositiveAmount(_) | Self::AmountTooLarge { .. } => "INVALID_AMOUNT",
            Self::TotalOverflow => "TOTAL_OVERFLOW",
            Self::EmptyName => "EMPTY_NAME",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn test_sequencing_display() {
        let err = LoanPaymentError::MustPayEarlierMonth {
            expected: ym("2026-01"),
            requested: ym("2026-02"),
        };
        assert_eq!(err.to_string(), "Must pay 2026-01 before 2026-02");

        let err = LoanPaymentError::CannotSkipMonth {
            skipped: ym("2026-03"),
        };
        assert_eq!(
            err.to_string(),
            "Cannot skip month 2026-03: it has no unpaid payments"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            LoanPaymentError::ProviderNotConsolidated(Uuid::nil()).kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            LoanPaymentError::CannotUnpayEarlierMonth {
                latest: ym("2026-02"),
                requested: ym("2026-01"),
            }
            .http_status_code(),
            422
        );
        assert_eq!(LoanPaymentError::EmptyName.http_status_code(), 400);
    }
}
