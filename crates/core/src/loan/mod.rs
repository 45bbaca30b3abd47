//! Loan providers, loans and the consolidated payment engine.
//!
//! This module implements:
//! - Payment modes (per item, consolidated monthly)
//! - The month-ordered payment schedule and its sequencing rules
//! - Loan schedule generation
//! - Error types for loan payment operations

pub mod error;
pub mod schedule;
pub mod service;
pub mod types;

#[cfg(test)]
mod schedule_props;

pub use error::LoanPaymentError;
pub use schedule::PaymentSchedule;
pub use service::{LoanService, MAX_TERM_MONTHS};
pub use types::{
    MonthStatus, PayMonthResult, PayRangeResult, PaymentMode, PaymentRow, ProviderPaymentStatus,
    ScheduledPayment, UnpayMonthResult,
};
