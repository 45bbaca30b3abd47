//! Recurring service: template validation and projection scheduling.

use chrono::NaiveDate;
use ledgerly_shared::types::YearMonth;
use uuid::Uuid;

use super::error::RecurringError;
use super::types::{TemplateSpec, TemplateWindow};
use crate::ledger::{EntryType, MAX_AMOUNT_MINOR};

/// Stateless service for recurring template rules.
pub struct RecurringService;

impl RecurringService {
    /// Validates a due day.
    pub fn validate_due_day(due_day: u32) -> Result<(), RecurringError> {
        if !(1..=31).contains(&due_day) {
            return Err(RecurringError::InvalidDueDay(due_day));
        }
        Ok(())
    }

    /// Validates raw template fields.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: name, entry type, amount, due day,
    /// then the date window.
    pub fn validate_template(
        name: &str,
        entry_type: &str,
        amount_minor: i64,
        due_day: u32,
        starts_on: Option<NaiveDate>,
        ends_on: Option<NaiveDate>,
    ) -> Result<TemplateSpec, RecurringError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RecurringError::EmptyName);
        }

        let entry_type = match EntryType::parse(entry_type) {
            Some(t @ (EntryType::Income | EntryType::Expense)) => t,
            _ => return Err(RecurringError::InvalidEntryType(entry_type.to_string())),
        };

        if amount_minor <= 0 {
            return Err(RecurringError::NonPositiveAmount(amount_minor));
        }
        if amount_minor > MAX_AMOUNT_MINOR {
            return Err(RecurringError::AmountTooLarge {
                max: MAX_AMOUNT_MINOR,
                actual: amount_minor,
            });
        }
        Self::validate_due_day(due_day)?;

        if let (Some(start), Some(end)) = (starts_on, ends_on) {
            if end < start {
                return Err(RecurringError::InvalidDateRange);
            }
        }

        Ok(TemplateSpec {
            name: trimmed.to_string(),
            entry_type,
            amount_minor,
            due_day,
            starts_on,
            ends_on,
        })
    }

    /// Whether a template produces an entry in `month`.
    ///
    /// Inactive templates never do; otherwise the month must not lie before
    /// the month of `starts_on` or after the month of `ends_on`.
    #[must_use]
    pub fn is_due_in(window: &TemplateWindow, month: YearMonth) -> bool {
        if !window.is_active {
            return false;
        }
        if let Some(start) = window.starts_on {
            if month < YearMonth::from_date(start) {
                return false;
            }
        }
        if let Some(end) = window.ends_on {
            if month > YearMonth::from_date(end) {
                return false;
            }
        }
        true
    }

    /// Date of the projection for `month`, with the due day clamped.
    #[must_use]
    pub fn due_date(month: YearMonth, due_day: u32) -> NaiveDate {
        month.clamp_day(due_day)
    }

    /// Store-level idempotency key of a projection.
    #[must_use]
    pub fn projection_key(template_id: Uuid, month: YearMonth) -> String {
        format!("{template_id}:{month}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[rstest]
    #[case("2026-02", 31, "2026-02-28")]
    #[case("2024-02", 31, "2024-02-29")]
    #[case("2026-06", 31, "2026-06-30")]
    #[case("2026-06", 1, "2026-06-01")]
    fn test_due_date_clamps(#[case] month: &str, #[case] day: u32, #[case] expected: &str) {
        assert_eq!(RecurringService::due_date(ym(month), day), date(expected));
    }

    #[rstest]
    #[case(true, None, None, "2026-05", true)]
    #[case(false, None, None, "2026-05", false)]
    #[case(true, Some("2026-05-20"), None, "2026-05", true)]
    #[case(true, Some("2026-05-20"), None, "2026-04", false)]
    #[case(true, None, Some("2026-05-01"), "2026-05", true)]
    #[case(true, None, Some("2026-05-01"), "2026-06", false)]
    fn test_is_due_in(
        #[case] is_active: bool,
        #[case] starts_on: Option<&str>,
        #[case] ends_on: Option<&str>,
        #[case] month: &str,
        #[case] expected: bool,
    ) {
        let window = TemplateWindow {
            is_active,
            starts_on: starts_on.map(date),
            ends_on: ends_on.map(date),
        };
        assert_eq!(RecurringService::is_due_in(&window, ym(month)), expected);
    }

    #[test]
    fn test_validate_template() {
        let spec =
            RecurringService::validate_template(" Rent ", "expense", 150_000, 31, None, None)
                .unwrap();
        assert_eq!(spec.name, "Rent");
        assert_eq!(spec.entry_type, EntryType::Expense);

        assert!(matches!(
            RecurringService::validate_template("Rent", "transfer", 1, 1, None, None),
            Err(RecurringError::InvalidEntryType(_))
        ));
        assert!(matches!(
            RecurringService::validate_template("Rent", "expense", 0, 1, None, None),
            Err(RecurringError::NonPositiveAmount(0))
        ));
        assert!(matches!(
            RecurringService::validate_template("Rent", "expense", i64::MAX, 1, None, None),
            Err(RecurringError::AmountTooLarge { .. })
        ));
        assert!(matches!(
            RecurringService::validate_template("Rent", "expense", 1, 32, None, None),
            Err(RecurringError::InvalidDueDay(32))
        ));
        assert!(matches!(
            RecurringService::validate_template(
                "Rent",
                "expense",
                1,
                1,
                Some(date("2026-05-01")),
                Some(date("2026-04-01"))
            ),
            Err(RecurringError::InvalidDateRange)
        ));
    }

    #[test]
    fn test_projection_key() {
        let id = Uuid::nil();
        assert_eq!(
            RecurringService::projection_key(id, ym("2026-05")),
            "00000000-0000-0000-0000-000000000000:2026-05"
        );
    }
}
