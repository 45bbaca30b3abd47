//! Transaction groups and auto-detection.
//!
//! Totals and child counts are never stored; they are recomputed from live
//! children on every read.

pub mod error;
pub mod service;
pub mod types;

pub use error::GroupError;
pub use service::{GroupingService, MAX_GROUP_NAME_LEN, MIN_AUTO_GROUP_SIZE};
pub use types::{AutoGroupPlan, DetectionCandidate, GroupTotals};
