//! Property-based tests for consolidated payment sequencing.
//!
//! - Property 1: Paying the earliest unpaid month keeps the paid set contiguous
//! - Property 2: Any other month is rejected with the earliest as expected
//! - Property 3: Unpaying the latest paid month keeps the paid set contiguous
//! - Property 4: Pay then unpay of the same month restores the schedule

use ledgerly_shared::types::YearMonth;
use proptest::prelude::*;

use super::error::LoanPaymentError;
use super::schedule::PaymentSchedule;
use super::types::PaymentRow;

/// Strategy for a contiguous schedule: `len` months starting at a random
/// month, the first `paid` of them paid, each with 1..=3 payments.
fn arb_contiguous_schedule() -> impl Strategy<Value = PaymentSchedule> {
    (2000i32..2100, 1u32..=12, 1u32..=24)
        .prop_flat_map(|(year, month, len)| {
            (
                Just(year),
                Just(month),
                Just(len),
                0..=len,
                prop::collection::vec((1usize..=3, 1i64..1_000_000), len as usize),
            )
        })
        .prop_map(|(year, month, _len, paid, per_month)| {
            let start = YearMonth::new(year, month).unwrap();
            let rows = per_month
                .into_iter()
                .enumerate()
                .flat_map(|(offset, (count, amount))| {
                    let offset = u32::try_from(offset).unwrap();
                    let month = start.plus_months(offset);
                    let is_paid = offset < paid;
                    (0..count).map(move |_| PaymentRow {
                        month,
                        is_paid,
                        amount_minor: amount,
                    })
                })
                .collect::<Vec<_>>();
            PaymentSchedule::from_rows(rows).unwrap()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* contiguous schedule, paying the earliest unpaid month succeeds
    /// and leaves it contiguous.
    #[test]
    fn prop_pay_earliest_stays_contiguous(schedule in arb_contiguous_schedule()) {
        prop_assert!(schedule.is_contiguous());
        if let Some(earliest) = schedule.earliest_unpaid() {
            let status = schedule.validate_pay_month(earliest).unwrap();
            prop_assert!(status.has_unpaid());
            let after = schedule.with_months_paid(&[earliest]);
            prop_assert!(after.is_contiguous());
            prop_assert!(after.earliest_unpaid().is_none_or(|next| next > earliest));
        } else {
            prop_assert!(schedule.latest_paid().is_some());
        }
    }

    /// *For any* month other than the earliest unpaid, paying is rejected.
    #[test]
    fn prop_pay_other_month_rejected(
        schedule in arb_contiguous_schedule(),
        offset in 1u32..24,
    ) {
        if let Some(earliest) = schedule.earliest_unpaid() {
            let requested = earliest.plus_months(offset);
            let is_expected_error = matches!(
                schedule.validate_pay_month(requested),
                Err(LoanPaymentError::MustPayEarlierMonth { expected, requested: got })
                    if expected == earliest && got == requested
            );
            prop_assert!(is_expected_error);
        }
    }

    /// *For any* contiguous schedule, unpaying the latest paid month succeeds
    /// and leaves it contiguous.
    #[test]
    fn prop_unpay_latest_stays_contiguous(schedule in arb_contiguous_schedule()) {
        if let Some(latest) = schedule.latest_paid() {
            schedule.validate_unpay_month(latest).unwrap();
            let after = schedule.with_month_unpaid(latest);
            prop_assert!(after.is_contiguous());
            prop_assert_eq!(after.latest_paid(), schedule.previous_paid_before(latest));
        } else {
            let is_no_paid = matches!(
                schedule.validate_unpay_month(YearMonth::new(2026, 1).unwrap()),
                Err(LoanPaymentError::NoPaidMonths)
            );
            prop_assert!(is_no_paid);
        }
    }

    /// *For any* schedule with an unpaid month, pay then unpay round-trips.
    #[test]
    fn prop_pay_then_unpay_round_trips(schedule in arb_contiguous_schedule()) {
        if let Some(earliest) = schedule.earliest_unpaid() {
            let paid = schedule.with_months_paid(&[earliest]);
            prop_assert_eq!(paid.latest_paid(), Some(earliest));
            let restored = paid.with_month_unpaid(earliest);
            prop_assert_eq!(restored, schedule);
        }
    }
}
