//! Core business logic for Ledgerly.
//!
//! This crate contains the pure rules of the ledger consistency engine with
//! ZERO web or database dependencies. Repositories in `ledgerly-db` load rows,
//! ask the services here whether a mutation is allowed, and persist the
//! outcome.
//!
//! # Modules
//!
//! - `ledger` - Ledger entries, the credit-card lifecycle and settlement rules
//! - `loan` - Consolidated loan payment sequencing
//! - `grouping` - Transaction groups and auto-detection planning
//! - `recurring` - Recurring templates and projection math
//! - `error` - Error taxonomy shared by every feature error

pub mod error;
pub mod grouping;
pub mod ledger;
pub mod loan;
pub mod recurring;

pub use error::ErrorKind;
