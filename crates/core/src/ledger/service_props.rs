//! Property-based tests for the CC lifecycle.
//!
//! - Property 1: CC state is a pure function of (is_paid, billed_at)
//! - Property 2: Settled is terminal under every toggle
//! - Property 3: Two toggles on an unsettled entry restore the state

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{CcSnapshot, CcState, SettlementIntent};

/// Strategy for optional billed timestamps within a sane range.
fn arb_billed_at() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    prop_oneof![
        Just(None),
        (1_600_000_000i64..1_900_000_000i64)
            .prop_map(|secs| Utc.timestamp_opt(secs, 0).single()),
    ]
}

/// Strategy for settlement intents.
fn arb_intent() -> impl Strategy<Value = SettlementIntent> {
    prop_oneof![
        Just(SettlementIntent::Immediate),
        Just(SettlementIntent::Deferred)
    ]
}

/// Strategy for CC snapshots.
fn arb_cc_snapshot() -> impl Strategy<Value = CcSnapshot> {
    (any::<bool>(), arb_billed_at(), arb_intent()).prop_map(|(is_paid, billed_at, intent)| {
        CcSnapshot {
            is_cc_payment: true,
            settlement_intent: Some(intent),
            is_paid,
            billed_at,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* (is_paid, billed_at), the state follows the derivation table.
    #[test]
    fn prop_cc_state_is_deterministic(is_paid in any::<bool>(), billed_at in arb_billed_at()) {
        let state = CcState::from_parts(is_paid, billed_at);
        let expected = match (is_paid, billed_at) {
            (true, _) => CcState::Settled,
            (false, None) => CcState::Pending,
            (false, Some(_)) => CcState::Billed,
        };
        prop_assert_eq!(state, expected);
        prop_assert_eq!(state, CcState::from_parts(is_paid, billed_at));
    }

    /// *For any* settled snapshot, toggling is rejected.
    #[test]
    fn prop_settled_is_terminal(snapshot in arb_cc_snapshot()) {
        let result = LedgerService::toggle_billed(Uuid::nil(), &snapshot, Utc::now());
        if snapshot.is_paid {
            let is_invalid_transition = matches!(
                result,
                Err(LedgerError::InvalidCcStateTransition { from: CcState::Settled, .. })
            );
            prop_assert!(is_invalid_transition);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    /// *For any* unsettled snapshot, toggling twice returns to the original state.
    #[test]
    fn prop_double_toggle_round_trips(snapshot in arb_cc_snapshot()) {
        prop_assume!(!snapshot.is_paid);
        let now = Utc::now();

        let first = LedgerService::toggle_billed(Uuid::nil(), &snapshot, now).unwrap();
        let after_first = CcSnapshot { billed_at: first.billed_at, ..snapshot };
        prop_assert_ne!(after_first.state(), snapshot.state());

        let second = LedgerService::toggle_billed(Uuid::nil(), &after_first, now).unwrap();
        let after_second = CcSnapshot { billed_at: second.billed_at, ..after_first };
        prop_assert_eq!(after_second.state(), snapshot.state());
        prop_assert!(after_second.state() != CcState::Settled);
    }

    /// *For any* settled snapshot, the intent is frozen.
    #[test]
    fn prop_intent_frozen_once_paid(snapshot in arb_cc_snapshot(), intent in arb_intent()) {
        let result = LedgerService::update_settlement_intent(&snapshot, intent.as_str());
        if snapshot.is_paid {
            prop_assert!(matches!(result, Err(LedgerError::TransactionAlreadyPaid)));
        } else {
            prop_assert_eq!(result.unwrap(), intent);
        }
    }
}
