//! Common types used across the application.

pub mod month;
pub mod pagination;

pub use month::{MonthParseError, YearMonth};
pub use pagination::{PageMeta, PageRequest, PageResponse};
