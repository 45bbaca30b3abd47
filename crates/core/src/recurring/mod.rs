//! Recurring templates and lazy projection generation.
//!
//! A template yields at most one projected entry per month. Projections are
//! replaceable until a user edits one, after which it is an actual entry and
//! survives template edits and deletes.

pub mod error;
pub mod service;
pub mod types;

pub use error::RecurringError;
pub use service::RecurringService;
pub use types::{
    DeleteTemplateResult, GenerationResult, TemplateSpec, TemplateWindow, UpdateTemplateResult,
};
