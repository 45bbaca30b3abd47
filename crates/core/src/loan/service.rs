//! Loan service: provider/loan validation and payment-mode rules.

use std::collections::HashSet;

use chrono::NaiveDate;
use ledgerly_shared::types::YearMonth;
use uuid::Uuid;

use super::error::LoanPaymentError;
use super::schedule::PaymentSchedule;
use super::types::{PaymentMode, ProviderPaymentStatus, ScheduledPayment};
use crate::ledger::{MAX_AMOUNT_MINOR, MAX_BATCH_SIZE};

/// Longest accepted loan term, in months.
pub const MAX_TERM_MONTHS: u32 = 600;

/// Stateless service for loan rules.
pub struct LoanService;

impl LoanService {
    /// Validates a provider and returns its trimmed name.
    pub fn validate_provider(name: &str, cutoff_day: u32) -> Result<String, LoanPaymentError> {
        let name = Self::validate_name(name)?;
        if !(1..=31).contains(&cutoff_day) {
            return Err(LoanPaymentError::InvalidCutoffDay(cutoff_day));
        }
        Ok(name)
    }

    /// Validates a trimmed, non-empty name.
    pub fn validate_name(name: &str) -> Result<String, LoanPaymentError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(LoanPaymentError::EmptyName);
        }
        Ok(trimmed.to_string())
    }

    /// Validates a principal or installment amount.
    pub fn validate_amount(amount_minor: i64) -> Result<(), LoanPaymentError> {
        if amount_minor <= 0 {
            return Err(LoanPaymentError::NonPositiveAmount(amount_minor));
        }
        if amount_minor > MAX_AMOUNT_MINOR {
            return Err(LoanPaymentError::AmountTooLarge {
                max: MAX_AMOUNT_MINOR,
                actual: amount_minor,
            });
        }
        Ok(())
    }

    /// Builds the payment schedule of a new loan.
    ///
    /// One payment per consecutive month starting at `first_due`.
    pub fn build_schedule(
        first_due: YearMonth,
        term_months: u32,
        monthly_amount_minor: i64,
    ) -> Result<Vec<ScheduledPayment>, LoanPaymentError> {
        if term_months == 0 || term_months > MAX_TERM_MONTHS {
            return Err(LoanPaymentError::InvalidTerm {
                max: MAX_TERM_MONTHS,
                actual: term_months,
            });
        }
        Self::validate_amount(monthly_amount_minor)?;

        Ok((0..term_months)
            .map(|offset| ScheduledPayment {
                month: first_due.plus_months(offset),
                amount_minor: monthly_amount_minor,
            })
            .collect())
    }

    /// Date of the ledger entry for a payment due in `month`.
    ///
    /// The cutoff day is clamped to the month's last day.
    #[must_use]
    pub fn due_date(month: YearMonth, cutoff_day: u32) -> NaiveDate {
        month.clamp_day(cutoff_day)
    }

    /// Fails unless the provider pays in consolidated monthly mode.
    pub fn require_consolidated(
        provider_id: Uuid,
        mode: PaymentMode,
    ) -> Result<(), LoanPaymentError> {
        match mode {
            PaymentMode::ConsolidatedMonthly => Ok(()),
            PaymentMode::PerItem => Err(LoanPaymentError::ProviderNotConsolidated(provider_id)),
        }
    }

    /// Fails unless individual payment toggles are allowed.
    pub fn require_per_item(provider_id: Uuid, mode: PaymentMode) -> Result<(), LoanPaymentError> {
        match mode {
            PaymentMode::PerItem => Ok(()),
            PaymentMode::ConsolidatedMonthly => Err(
                LoanPaymentError::ConsolidatedRequiresMonthlyPayment(provider_id),
            ),
        }
    }

    /// Dedupes payment ids and enforces the batch bounds.
    pub fn normalize_payment_ids(ids: &[Uuid]) -> Result<Vec<Uuid>, LoanPaymentError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        if unique.is_empty() {
            return Err(LoanPaymentError::PaymentIdsInvalid {
                expected: 0,
                matched: 0,
            });
        }
        if unique.len() > MAX_BATCH_SIZE {
            return Err(LoanPaymentError::BatchTooLarge {
                max: MAX_BATCH_SIZE,
                actual: unique.len(),
            });
        }
        Ok(unique)
    }

    /// Checks that every supplied payment id matched the provider month.
    pub fn verify_payment_ids(expected: usize, matched: usize) -> Result<(), LoanPaymentError> {
        if expected == 0 || expected != matched {
            return Err(LoanPaymentError::PaymentIdsInvalid { expected, matched });
        }
        Ok(())
    }

    /// Summarizes a provider's schedule month by month.
    #[must_use]
    pub fn payment_status(
        provider_id: Uuid,
        payment_mode: PaymentMode,
        schedule: &PaymentSchedule,
    ) -> ProviderPaymentStatus {
        ProviderPaymentStatus {
            provider_id,
            payment_mode,
            months: schedule.months().copied().collect(),
            next_payable_month: schedule.earliest_unpaid(),
            latest_paid_month: schedule.latest_paid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::types::PaymentRow;
    use rstest::rstest;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn test_build_schedule_crosses_year() {
        let payments = LoanService::build_schedule(ym("2025-11"), 3, 250_000).unwrap();
        let months: Vec<_> = payments.iter().map(|p| p.month.to_string()).collect();
        assert_eq!(months, vec!["2025-11", "2025-12", "2026-01"]);
        assert!(payments.iter().all(|p| p.amount_minor == 250_000));
    }

    #[rstest]
    #[case(0)]
    #[case(601)]
    fn test_build_schedule_rejects_term(#[case] term: u32) {
        assert!(matches!(
            LoanService::build_schedule(ym("2026-01"), term, 100),
            Err(LoanPaymentError::InvalidTerm { .. })
        ));
    }

    #[test]
    fn test_build_schedule_rejects_amount() {
        assert!(matches!(
            LoanService::build_schedule(ym("2026-01"), 3, 0),
            Err(LoanPaymentError::NonPositiveAmount(0))
        ));
        assert!(matches!(
            LoanService::build_schedule(ym("2026-01"), 3, MAX_AMOUNT_MINOR + 1),
            Err(LoanPaymentError::AmountTooLarge { .. })
        ));
        assert!(LoanService::build_schedule(ym("2026-01"), 3, MAX_AMOUNT_MINOR).is_ok());
    }

    #[rstest]
    #[case("2026-02", 31, "2026-02-28")]
    #[case("2028-02", 30, "2028-02-29")]
    #[case("2026-04", 31, "2026-04-30")]
    #[case("2026-05", 15, "2026-05-15")]
    fn test_due_date_clamps(#[case] month: &str, #[case] day: u32, #[case] expected: &str) {
        assert_eq!(
            LoanService::due_date(ym(month), day).to_string(),
            expected.to_string()
        );
    }

    #[rstest]
    #[case(0)]
    #[case(32)]
    fn test_validate_provider_cutoff(#[case] day: u32) {
        assert!(matches!(
            LoanService::validate_provider("Bank", day),
            Err(LoanPaymentError::InvalidCutoffDay(_))
        ));
    }

    #[test]
    fn test_validate_provider_trims_name() {
        assert_eq!(LoanService::validate_provider("  Bank ", 5).unwrap(), "Bank");
        assert!(matches!(
            LoanService::validate_provider("   ", 5),
            Err(LoanPaymentError::EmptyName)
        ));
    }

    #[test]
    fn test_mode_guards() {
        let id = Uuid::new_v4();
        assert!(LoanService::require_consolidated(id, PaymentMode::ConsolidatedMonthly).is_ok());
        assert!(matches!(
            LoanService::require_consolidated(id, PaymentMode::PerItem),
            Err(LoanPaymentError::ProviderNotConsolidated(got)) if got == id
        ));
        assert!(LoanService::require_per_item(id, PaymentMode::PerItem).is_ok());
        assert!(matches!(
            LoanService::require_per_item(id, PaymentMode::ConsolidatedMonthly),
            Err(LoanPaymentError::ConsolidatedRequiresMonthlyPayment(_))
        ));
    }

    #[test]
    fn test_verify_payment_ids() {
        assert!(LoanService::verify_payment_ids(2, 2).is_ok());
        assert!(LoanService::verify_payment_ids(0, 0).is_err());
        assert!(matches!(
            LoanService::verify_payment_ids(3, 1),
            Err(LoanPaymentError::PaymentIdsInvalid {
                expected: 3,
                matched: 1
            })
        ));
    }

    #[test]
    fn test_normalize_payment_ids() {
        let id = Uuid::new_v4();
        assert_eq!(LoanService::normalize_payment_ids(&[id, id]).unwrap(), vec![id]);
        assert!(LoanService::normalize_payment_ids(&[]).is_err());
        let many: Vec<Uuid> = (0..101).map(|_| Uuid::new_v4()).collect();
        assert!(matches!(
            LoanService::normalize_payment_ids(&many),
            Err(LoanPaymentError::BatchTooLarge { max: 100, actual: 101 })
        ));
    }

    #[test]
    fn test_payment_status() {
        let schedule = PaymentSchedule::from_rows([
            PaymentRow {
                month: ym("2026-01"),
                is_paid: true,
                amount_minor: 100,
            },
            PaymentRow {
                month: ym("2026-02"),
                is_paid: false,
                amount_minor: 100,
            },
        ])
        .unwrap();
        let status =
            LoanService::payment_status(Uuid::nil(), PaymentMode::ConsolidatedMonthly, &schedule);
        assert_eq!(status.months.len(), 2);
        assert_eq!(status.next_payable_month, Some(ym("2026-02")));
        assert_eq!(status.latest_paid_month, Some(ym("2026-01")));
    }
}
