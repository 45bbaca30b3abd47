//! Recurring template inputs and regenerator results.

use chrono::NaiveDate;
use ledgerly_shared::types::YearMonth;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::EntryType;

/// Validated template fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpec {
    /// Trimmed name.
    pub name: String,
    /// Income or expense.
    pub entry_type: EntryType,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Day of month, clamped per month on generation.
    pub due_day: u32,
    /// First date the template applies to.
    pub starts_on: Option<NaiveDate>,
    /// Last date the template applies to.
    pub ends_on: Option<NaiveDate>,
}

/// The scheduling window of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateWindow {
    /// Whether the template is active.
    pub is_active: bool,
    /// First date the template applies to.
    pub starts_on: Option<NaiveDate>,
    /// Last date the template applies to.
    pub ends_on: Option<NaiveDate>,
}

/// Outcome of generating projections for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    /// Month generated.
    pub month: YearMonth,
    /// Ids of the entries created.
    pub created_entry_ids: Vec<Uuid>,
    /// Templates that already had an entry for the month.
    pub skipped_templates: Vec<Uuid>,
}

impl GenerationResult {
    /// Empty result for `month`.
    #[must_use]
    pub fn for_month(month: YearMonth) -> Self {
        Self {
            month,
            created_entry_ids: Vec::new(),
            skipped_templates: Vec::new(),
        }
    }

    /// Number of entries created.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created_entry_ids.len()
    }
}

/// Outcome of a template update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateTemplateResult {
    /// The template.
    pub template_id: Uuid,
    /// Projected entries removed.
    pub projections_deleted: u64,
}

/// Outcome of a template delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteTemplateResult {
    /// The template.
    pub template_id: Uuid,
    /// Projected entries removed.
    pub projections_deleted: u64,
    /// Actual entries detached from the template.
    pub actuals_orphaned: u64,
}
