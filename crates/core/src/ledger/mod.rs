//! Ledger entries and the credit-card lifecycle.
//!
//! This module implements:
//! - Entry types, sources and settlement intents
//! - The derived CC state (pending, billed, settled)
//! - Pure transition rules for toggling billed and changing intent
//! - Settlement batch validation
//! - Error types for ledger operations

pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{
    CcFields, CcSnapshot, CcState, CcTransition, EntrySource, EntryType, SettlementIntent,
};
pub use validation::{
    MAX_AMOUNT_MINOR, MAX_BATCH_SIZE, checked_total, normalize_batch_ids, normalize_description,
    validate_amount, validate_date_range,
};
