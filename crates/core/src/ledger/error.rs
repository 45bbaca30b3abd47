//! Ledger error types for entry validation and CC lifecycle errors.

use thiserror::Error;
use uuid::Uuid;

use super::types::CcState;
use crate::error::ErrorKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Lookup Errors ==========
    /// Entry not found (or owned by another workspace).
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    /// Some ids of a bulk settlement did not match a settleable entry.
    #[error("Transactions not found: expected {expected} settleable transactions, matched {matched}")]
    TransactionsNotFound {
        /// Number of distinct ids requested.
        expected: usize,
        /// Number of rows the store actually updated.
        matched: u64,
    },

    // ========== CC Lifecycle Errors ==========
    /// The entry is not a credit-card charge with an intent.
    #[error("Transaction {0} is not a credit card transaction")]
    NotCcTransaction(Uuid),

    /// The requested transition is not allowed from the current state.
    #[error("Invalid credit card state transition from {from} to {to}")]
    InvalidCcStateTransition {
        /// Current state.
        from: CcState,
        /// Attempted state.
        to: CcState,
    },

    /// Settlement intent only applies to credit-card entries.
    #[error("Settlement intent is only applicable to credit card transactions")]
    SettlementIntentNotApplicable,

    /// The entry is already paid.
    #[error("Transaction is already paid")]
    TransactionAlreadyPaid,

    /// Unknown settlement intent value.
    #[error("Invalid settlement intent: {0} (expected immediate or deferred)")]
    InvalidSettlementIntent(String),

    // ========== Validation Errors ==========
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

    /// A sum of amounts does not fit in 64 bits.
    #[error("Total amount is out of range")]
    TotalOverflow,

    /// Description must not be blank.
    #[error("Description cannot be empty")]
    EmptyDescription,

    /// A batch operation was called with no ids.
    #[error("At least one transaction id is required")]
    EmptyBatch,

    /// A batch operation exceeded the size cap.
    #[error("Batch of {actual} transactions exceeds the limit of {max}")]
    BatchTooLarge {
        /// Maximum batch size.
        max: usize,
        /// Requested batch size.
        actual: usize,
    },

    /// `from` is after `to`.
    #[error("Invalid date range: start is after end")]
    InvalidDateRange,

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TransactionNotFound(_) | Self::TransactionsNotFound { .. } => ErrorKind::NotFound,
            Self::NotCcTransaction(_)
            | Self::InvalidCcStateTransition { .. }
            | Self::SettlementIntentNotApplicable
            | Self::TransactionAlreadyPaid => ErrorKind::StateConflict,
            Self::InvalidSettlementIntent(_)
            | Self::NonPositiveAmount(_)
            | Self::AmountTooLarge { .. }
            | Self::TotalOverflow
            | Self::EmptyDescription
            | Self::EmptyBatch
            | Self::BatchTooLarge { .. }
            | Self::InvalidDateRange => ErrorKind::Validation,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::TransactionsNotFound { .. } => "TRANSACTIONS_NOT_FOUND",
            Self::NotCcTransaction(_) => "NOT_CC_TRANSACTION",
            Self::InvalidCcStateTransition { .. } => "INVALID_CC_STATE_TRANSITION",
            Self::SettlementIntentNotApplicable => "SETTLEMENT_INTENT_NOT_APPLICABLE",
            Self::TransactionAlreadyPaid => "TRANSACTION_ALREADY_PAID",
            Self::InvalidSettlementIntent(_) => "INVALID_SETTLEMENT_INTENT",
            Self::NonPositiveAmount(_) | Self::AmountTooLarge { .. } => "INVALID_AMOUNT",
            Self::TotalOverflow => "TOTAL_OVERFLOW",
            Self::EmptyDescription => "EMPTY_DESCRIPTION",
            Self::EmptyBatch => "EMPTY_BATCH",
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
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

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::NotCcTransaction(Uuid::nil()).error_code(),
            "NOT_CC_TRANSACTION"
        );
        assert_eq!(
            LedgerError::TransactionsNotFound {
                expected: 3,
                matched: 2
            }
            .error_code(),
            "TRANSACTIONS_NOT_FOUND"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            LedgerError::TransactionNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(LedgerError::TransactionAlreadyPaid.http_status_code(), 409);
        assert_eq!(
            LedgerError::InvalidSettlementIntent("x".into()).http_status_code(),
            400
        );
        assert_eq!(LedgerError::Database("x".into()).http_status_code(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InvalidCcStateTransition {
            from: CcState::Settled,
            to: CcState::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Invalid credit card state transition from settled to pending"
        );
    }
}
