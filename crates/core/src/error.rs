//! Error taxonomy shared by every feature error.
//!
//! Each feature keeps its own `thiserror` enum; `kind()` places a variant in
//! one of five buckets, which decides the HTTP status and the [`AppError`]
//! variant it becomes.

use ledgerly_shared::AppError;
use serde::{Deserialize, Serialize};

/// Coarse classification of domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Entity absent or owned by another workspace.
    NotFound,
    /// Malformed input (amount, date, enum value, batch size).
    Validation,
    /// Months paid or unpaid out of order.
    SequentialOrderViolation,
    /// The entity's current state forbids the operation.
    StateConflict,
    /// Storage failure.
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Validation => 400,
            Self::SequentialOrderViolation => 422,
            Self::StateConflict => 409,
            Self::Internal => 500,
        }
    }

    /// Converts a rendered domain error into an [`AppError`].
    ///
    /// Internal errors drop `message` entirely.
    #[must_use]
    pub fn into_app_error(self, message: String) -> AppError {
        match self {
            Self::NotFound => AppError::NotFound(message),
            Self::Validation => AppError::Validation(message),
            Self::SequentialOrderViolation => AppError::BusinessRule(message),
            Self::StateConflict => AppError::Conflict(message),
            Self::Internal => AppError::internal(),
        }
    }
}

/// Implements `From<$err> for AppError` via the error's `kind()`.
macro_rules! impl_into_app_error {
    ($($err:ty),+ $(,)?) => {
        $(
            impl From<$err> for ledgerly_shared::AppError {
                fn from(err: $err) -> Self {
                    err.kind().into_app_error(err.to_string())
                }
            }
        )+
    };
}

impl_into_app_error!(
    crate::ledger::LedgerError,
    crate::loan::LoanPaymentError,
    crate::grouping::GroupError,
    crate::recurring::RecurringError,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerError;
    use crate::loan::LoanPaymentError;
    use ledgerly_shared::types::YearMonth;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::NotFound.http_status_code(), 404);
        assert_eq!(ErrorKind::Validation.http_status_code(), 400);
        assert_eq!(ErrorKind::SequentialOrderViolation.http_status_code(), 422);
        assert_eq!(ErrorKind::StateConflict.http_status_code(), 409);
        assert_eq!(ErrorKind::Internal.http_status_code(), 500);
    }

    #[test]
    fn test_database_errors_are_opaque() {
        let err = LedgerError::Database("relation \"ledger_entries\" does not exist".into());
        let app: AppError = err.into();
        assert_eq!(app, AppError::internal());
        assert!(!app.to_string().contains("ledger_entries"));
    }

    #[test]
    fn test_sequencing_errors_become_business_rules() {
        let err = LoanPaymentError::MustPayEarlierMonth {
            expected: YearMonth::new(2026, 1).unwrap(),
            requested: YearMonth::new(2026, 2).unwrap(),
        };
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 422);
        assert!(app.to_string().contains("2026-01"));
    }
}
