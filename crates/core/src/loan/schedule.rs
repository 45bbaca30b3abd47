//! Month-ordered view of a provider's payments.
//!
//! In consolidated mode the paid months of a provider must always form a
//! contiguous prefix of the months that have payments. Every pay/unpay
//! request is validated here before anything is written.

use std::collections::BTreeMap;

use ledgerly_shared::types::YearMonth;

use super::error::LoanPaymentError;
use super::types::{MonthStatus, PaymentRow};

/// Payments of one provider aggregated per due month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentSchedule {
    months: BTreeMap<YearMonth, MonthStatus>,
}

impl PaymentSchedule {
    /// Builds a schedule from individual payment rows, in any order.
    ///
    /// Fails with `TotalOverflow` if a month's total does not fit in an `i64`.
    pub fn from_rows<I>(rows: I) -> Result<Self, LoanPaymentError>
    where
        I: IntoIterator<Item = PaymentRow>,
    {
        let mut months: BTreeMap<YearMonth, MonthStatus> = BTreeMap::new();
        for row in rows {
            let status = months
                .entry(row.month)
                .or_insert_with(|| MonthStatus::empty(row.month));
            status.payment_count += 1;
            status.total_minor = status
                .total_minor
                .checked_add(row.amount_minor)
                .ok_or(LoanPaymentError::TotalOverflow)?;
            if row.is_paid {
                status.paid_count += 1;
                status.paid_minor = status
                    .paid_minor
                    .checked_add(row.amount_minor)
                    .ok_or(LoanPaymentError::TotalOverflow)?;
            }
        }
        Ok(Self { months })
    }

    /// Whether the provider has no payments at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Per-month statuses in month order.
    pub fn months(&self) -> impl Iterator<Item = &MonthStatus> {
        self.months.values()
    }

    /// Status of a single month.
    #[must_use]
    pub fn month(&self, month: YearMonth) -> Option<&MonthStatus> {
        self.months.get(&month)
    }

    /// Earliest month that still has an unpaid payment.
    #[must_use]
    pub fn earliest_unpaid(&self) -> Option<YearMonth> {
        self.months
            .values()
            .find(|status| status.has_unpaid())
            .map(|status| status.month)
    }

    /// Latest month with a paid payment.
    #[must_use]
    pub fn latest_paid(&self) -> Option<YearMonth> {
        self.months
            .values()
            .rev()
            .find(|status| status.has_paid())
            .map(|status| status.month)
    }

    /// Latest paid month strictly before `month`.
    #[must_use]
    pub fn previous_paid_before(&self, month: YearMonth) -> Option<YearMonth> {
        self.months
            .range(..month)
            .rev()
            .find(|(_, status)| status.has_paid())
            .map(|(m, _)| *m)
    }

    /// Whether the paid months form a prefix of all months.
    ///
    /// Once a month with an unpaid payment is seen, no later month may hold
    /// a paid payment.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        let mut seen_unpaid = false;
        for status in self.months.values() {
            if seen_unpaid && status.has_paid() {
                return false;
            }
            if status.has_unpaid() {
                seen_unpaid = true;
            }
        }
        true
    }

    /// Checks that `target` is the month to pay next.
    ///
    /// # Errors
    ///
    /// - `NoUnpaidMonths` when everything is paid
    /// - `MustPayEarlierMonth` when `target` is not the earliest unpaid month
    pub fn validate_pay_month(&self, target: YearMonth) -> Result<MonthStatus, LoanPaymentError> {
        let earliest = self
            .earliest_unpaid()
            .ok_or(LoanPaymentError::NoUnpaidMonths)?;

        if target != earliest {
            return Err(LoanPaymentError::MustPayEarlierMonth {
                expected: earliest,
                requested: target,
            });
        }

        self.months
            .get(&target)
            .copied()
            .ok_or(LoanPaymentError::NoUnpaidMonths)
    }

    /// Plans paying every month from `start` through `end`.
    ///
    /// Returns the month statuses to pay, in order.
    ///
    /// # Errors
    ///
    /// - `EndMonthBeforeStart` when `end <= start`
    /// - `NoUnpaidMonths` / `MustPayEarlierMonth` when `start` is not next
    /// - `CannotSkipMonth` for the first month in range with nothing to pay
    pub fn plan_pay_range(
        &self,
        start: YearMonth,
        end: YearMonth,
    ) -> Result<Vec<MonthStatus>, LoanPaymentError> {
        if end <= start {
            return Err(LoanPaymentError::EndMonthBeforeStart { start, end });
        }

        let first = self.validate_pay_month(start)?;
        let mut plan = vec![first];

        let mut month = start.next();
        while month <= end {
            match self.months.get(&month) {
                Some(status) if status.has_unpaid() => plan.push(*status),
                _ => return Err(LoanPaymentError::CannotSkipMonth { skipped: month }),
            }
            month = month.next();
        }

        Ok(plan)
    }

    /// Checks that `target` is the month to unpay next.
    ///
    /// # Errors
    ///
    /// - `NoPaidMonths` when nothing is paid
    /// - `CannotUnpayEarlierMonth` when `target` is not the latest paid month
    pub fn validate_unpay_month(
        &self,
        target: YearMonth,
    ) -> Result<MonthStatus, LoanPaymentError> {
        let latest = self.latest_paid().ok_or(LoanPaymentError::NoPaidMonths)?;

        if target != latest {
            return Err(LoanPaymentError::CannotUnpayEarlierMonth {
                latest,
                requested: target,
            });
        }

        self.months
            .get(&target)
            .copied()
            .ok_or(LoanPaymentError::NoPaidMonths)
    }

    /// The schedule after every payment of `months` has been paid.
    #[must_use]
    pub fn with_months_paid(&self, months: &[YearMonth]) -> Self {
        let mut next = self.clone();
        for month in months {
            if let Some(status) = next.months.get_mut(month) {
                status.paid_count = status.payment_count;
                status.paid_minor = status.total_minor;
            }
        }
        next
    }

    /// The schedule after every payment of `month` has been unpaid.
    #[must_use]
    pub fn with_month_unpaid(&self, month: YearMonth) -> Self {
        let mut next = self.clone();
        if let Some(status) = next.months.get_mut(&month) {
            status.paid_count = 0;
            status.paid_minor = 0;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn row(month: &str, is_paid: bool, amount_minor: i64) -> PaymentRow {
        PaymentRow {
            month: ym(month),
            is_paid,
            amount_minor,
        }
    }

    fn schedule(rows: &[(&str, bool)]) -> PaymentSchedule {
        PaymentSchedule::from_rows(rows.iter().map(|(m, paid)| row(m, *paid, 1_000))).unwrap()
    }

    #[test]
    fn test_from_rows_aggregates_per_month() {
        let s = PaymentSchedule::from_rows([
            row("2026-02", false, 500),
            row("2026-01", true, 100),
            row("2026-01", false, 200),
        ])
        .unwrap();
        let jan = s.month(ym("2026-01")).unwrap();
        assert_eq!(jan.payment_count, 2);
        assert_eq!(jan.paid_count, 1);
        assert_eq!(jan.total_minor, 300);
        assert_eq!(jan.paid_minor, 100);
        let order: Vec<_> = s.months().map(|m| m.month).collect();
        assert_eq!(order, vec![ym("2026-01"), ym("2026-02")]);
    }

    #[test]
    fn test_from_rows_rejects_overflowing_month() {
        let result = PaymentSchedule::from_rows([
            row("2026-01", false, i64::MAX),
            row("2026-01", false, 1),
        ]);
        assert!(matches!(result, Err(LoanPaymentError::TotalOverflow)));
    }

    #[test]
    fn test_pay_month_must_be_earliest() {
        let s = schedule(&[("2026-01", false), ("2026-02", false), ("2026-03", false)]);

        let err = s.validate_pay_month(ym("2026-02")).unwrap_err();
        assert!(matches!(
            err,
            LoanPaymentError::MustPayEarlierMonth { expected, requested }
                if expected == ym("2026-01") && requested == ym("2026-02")
        ));

        let status = s.validate_pay_month(ym("2026-01")).unwrap();
        assert_eq!(status.month, ym("2026-01"));
        let after = s.with_months_paid(&[ym("2026-01")]);
        assert_eq!(after.earliest_unpaid(), Some(ym("2026-02")));
    }

    #[test]
    fn test_pay_month_when_all_paid() {
        let s = schedule(&[("2026-01", true)]);
        assert!(matches!(
            s.validate_pay_month(ym("2026-01")),
            Err(LoanPaymentError::NoUnpaidMonths)
        ));
        assert!(matches!(
            PaymentSchedule::default().validate_pay_month(ym("2026-01")),
            Err(LoanPaymentError::NoUnpaidMonths)
        ));
    }

    #[test]
    fn test_pay_range_cannot_skip_gap() {
        let s = schedule(&[("2026-01", false), ("2026-02", false), ("2026-04", false)]);
        let err = s.plan_pay_range(ym("2026-01"), ym("2026-04")).unwrap_err();
        assert!(matches!(
            err,
            LoanPaymentError::CannotSkipMonth { skipped } if skipped == ym("2026-03")
        ));
    }

    #[test]
    fn test_pay_range_plans_in_order() {
        let s = schedule(&[("2026-01", true), ("2026-02", false), ("2026-03", false)]);
        let plan = s.plan_pay_range(ym("2026-02"), ym("2026-03")).unwrap();
        let months: Vec<_> = plan.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![ym("2026-02"), ym("2026-03")]);
        assert_eq!(s.with_months_paid(&months).earliest_unpaid(), None);
    }

    #[rstest]
    #[case("2026-03", "2026-03")]
    #[case("2026-03", "2026-02")]
    fn test_pay_range_end_not_after_start(#[case] start: &str, #[case] end: &str) {
        let s = schedule(&[("2026-03", false)]);
        assert!(matches!(
            s.plan_pay_range(ym(start), ym(end)),
            Err(LoanPaymentError::EndMonthBeforeStart { .. })
        ));
    }

    #[test]
    fn test_pay_range_start_must_be_earliest() {
        let s = schedule(&[("2026-01", false), ("2026-02", false), ("2026-03", false)]);
        assert!(matches!(
            s.plan_pay_range(ym("2026-02"), ym("2026-03")),
            Err(LoanPaymentError::MustPayEarlierMonth { .. })
        ));
    }

    #[test]
    fn test_unpay_must_be_latest() {
        let s = schedule(&[("2026-01", true), ("2026-02", true), ("2026-03", false)]);

        let err = s.validate_unpay_month(ym("2026-01")).unwrap_err();
        assert!(matches!(
            err,
            LoanPaymentError::CannotUnpayEarlierMonth { latest, requested }
                if latest == ym("2026-02") && requested == ym("2026-01")
        ));

        s.validate_unpay_month(ym("2026-02")).unwrap();
        assert_eq!(s.previous_paid_before(ym("2026-02")), Some(ym("2026-01")));
        assert_eq!(s.previous_paid_before(ym("2026-01")), None);
        let after = s.with_month_unpaid(ym("2026-02"));
        assert_eq!(after.latest_paid(), Some(ym("2026-01")));
    }

    #[test]
    fn test_unpay_when_nothing_paid() {
        let s = schedule(&[("2026-01", false)]);
        assert!(matches!(
            s.validate_unpay_month(ym("2026-01")),
            Err(LoanPaymentError::NoPaidMonths)
        ));
    }

    #[rstest]
    #[case(&[("2026-01", true), ("2026-02", false)], true)]
    #[case(&[("2026-01", false), ("2026-02", true)], false)]
    #[case(&[("2026-01", true), ("2026-02", true)], true)]
    #[case(&[], true)]
    fn test_is_contiguous(#[case] rows: &[(&str, bool)], #[case] expected: bool) {
        assert_eq!(schedule(rows).is_contiguous(), expected);
    }
}
