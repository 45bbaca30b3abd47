//! Transaction group error types.

use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;

/// Errors that can occur during group operations.
#[derive(Debug, Error)]
pub enum GroupError {
    /// Group not found (or owned by another workspace).
    #[error("Transaction group not found: {0}")]
    NotFound(Uuid),

    /// Some entry ids are not live entries of the workspace.
    #[error("Entries not found: expected {expected}, found {found}")]
    EntriesNotFound {
        /// Number of distinct ids requested.
        expected: usize,
        /// Number that matched.
        found: usize,
    },

    /// Name must not be blank.
    #[error("Group name cannot be empty")]
    EmptyName,

    /// Name exceeds the column limit.
    #[error("Group name must be at most {max} characters")]
    NameTooLong {
        /// Maximum length.
        max: usize,
    },

    /// No entry ids given.
    #[error("At least one entry is required")]
    EmptyEntries,

    /// Too many entry ids in one call.
    #[error("Too many entries: maximum {max}, got {actual}")]
    BatchTooLarge {
        /// Maximum accepted.
        max: usize,
        /// Number supplied.
        actual: usize,
    },

    /// The sum of child amounts does not fit in 64 bits.
    #[error("Group total is out of range")]
    TotalOverflow,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl GroupError {
    /// Taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::EntriesNotFound { .. } => ErrorKind::NotFound,
            Self::EmptyName
            | Self::NameTooLong { .. }
            | Self::EmptyEntries
            | Self::BatchTooLarge { .. }
            | Self::TotalOverflow => ErrorKind::Validation,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "GROUP_NOT_FOUND",
            Self::EntriesNotFound { .. } => "ENTRIES_NOT_FOUND",
            Self::EmptyName => "EMPTY_NAME",
            Self::NameTooLong { .. } => "NAME_TOO_LONG",
            Self::EmptyEntries => "EMPTY_ENTRIES",
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            Self::TotalOverflow => "TOTAL_OVERFLOW",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }
}
