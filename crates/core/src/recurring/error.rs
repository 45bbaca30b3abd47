//! Recurring template error types.

use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;

/// Errors that can occur during recurring template operations.
#[derive(Debug, Error)]
pub enum RecurringError {
    /// Template not found (or owned by another workspace).
    #[error("Recurring template not found: {0}")]
    TemplateNotFound(Uuid),

    /// Due day outside 1..=31.
    #[error("Due day must be between 1 and 31, got {0}")]
    InvalidDueDay(u32),

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

    /// Name must not be blank.
    #[error("Template name cannot be empty")]
    EmptyName,

    /// `ends_on` precedes `starts_on`.
    #[error("Template end date must not be before its start date")]
    InvalidDateRange,

    /// Templates only produce income or expense entries.
    #[error("Invalid template entry type: {0} (expected income or expense)")]
    InvalidEntryType(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl RecurringError {
    /// Taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TemplateNotFound(_) => ErrorKind::NotFound,
            Self::InvalidDueDay(_)
            | Self::NonPositiveAmount(_)
            | Self::AmountTooLarge { .. }
            | Self::EmptyName
            | Self::InvalidDateRange
            | Self::InvalidEntryType(_) => ErrorKind::Validation,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            Self::InvalidDueDay(_) => "INVALID_DUE_DAY",
            Self::NonPositiveAmount(_) | Self::AmountTooLarge { .. } => "INVALID_AMOUNT",
            Self::EmptyName => "EMPTY_NAME",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::InvalidEntryType(_) => "INVALID_ENTRY_TYPE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }
}
