//! Repository abstractions for data access.
//!
//! Repositories load rows, ask the stateless services in `ledgerly-core`
//! whether a mutation is allowed, and persist the outcome inside a
//! [`UnitOfWork`](crate::unit_of_work::UnitOfWork).

pub mod group;
pub mod ledger;
pub mod loan;
pub mod recurring;

pub use group::{CreateGroupInput, DetectionResult, GroupRepository, GroupWithTotals};
pub use ledger::{
    ClearWorkspaceResult, CreateEntryInput, EntryFilter, LedgerRepository, SettlementResult,
    UpdateEntryInput,
};
pub use loan::{CreateLoanInput, CreateProviderInput, LoanRepository, LoanWithPayments};
pub use recurring::{CreateTemplateInput, RecurringRepository, UpdateTemplateInput};

use sea_orm::{DbErr, SqlErr};

/// Whether `err` is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
