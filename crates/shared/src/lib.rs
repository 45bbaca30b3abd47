//! Shared types, errors, and configuration for Ledgerly.
//!
//! This crate provides common types used across all other crates:
//! - `YearMonth` for month-granular ledger keys
//! - Pagination types for list queries
//! - Application-wide error types
//! - Configuration management and tracing bootstrap

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
