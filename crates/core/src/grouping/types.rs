//! Grouping types.

use ledgerly_shared::types::YearMonth;
use serde::Serialize;
use uuid::Uuid;

/// Computed aggregates of a group's live children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupTotals {
    /// Sum of child amounts, minor units.
    pub total_amount_minor: i64,
    /// Number of live children.
    pub child_count: u64,
}

/// An ungrouped loan-sourced entry of a consolidated provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionCandidate {
    /// The entry.
    pub entry_id: Uuid,
    /// Provider whose loan produced the entry.
    pub provider_id: Uuid,
    /// Provider display name.
    pub provider_name: String,
}

/// An auto-detected group to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoGroupPlan {
    /// The provider.
    pub provider_id: Uuid,
    /// Group name, `"<provider name> <YYYY-MM>"`.
    pub name: String,
    /// Month covered.
    pub month: YearMonth,
    /// Uniqueness key, `"<provider id>:<YYYY-MM>"`.
    pub auto_detect_key: String,
    /// Entries to assign, in input order.
    pub entry_ids: Vec<Uuid>,
}
