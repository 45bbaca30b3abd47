//! Ledger service for the credit-card lifecycle and settlement rules.
//!
//! This module implements the CC state machine as pure functions over a
//! [`CcSnapshot`]. Repositories fetch the row, ask the service for the
//! transition, and persist what it returns.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::LedgerError;
use super::types::{CcFields, CcSnapshot, CcState, CcTransition, SettlementIntent};
use super::validation::normalize_batch_ids;

/// Stateless service for CC lifecycle transitions.
pub struct LedgerService;

impl LedgerService {
    /// Resolves the CC columns of a new entry.
    ///
    /// CC entries without an explicit intent default to `Immediate`.
    ///
    /// # Errors
    ///
    /// `SettlementIntentNotApplicable` if an intent is given for a non-CC entry.
    pub fn resolve_cc_fields(
        is_cc_payment: bool,
        settlement_intent: Option<SettlementIntent>,
    ) -> Result<CcFields, LedgerError> {
        if !is_cc_payment {
            if settlement_intent.is_some() {
                return Err(LedgerError::SettlementIntentNotApplicable);
            }
            return Ok(CcFields {
                is_cc_payment: false,
                settlement_intent: None,
            });
        }

        Ok(CcFields {
            is_cc_payment: true,
            settlement_intent: Some(settlement_intent.unwrap_or(SettlementIntent::Immediate)),
        })
    }

    /// Flips a CC entry between pending and billed.
    ///
    /// # Returns
    /// * `Ok(CcTransition)` with the new `billed_at` value
    /// * `Err(LedgerError::NotCcTransaction)` if the entry is not a CC charge with an intent
    /// * `Err(LedgerError::InvalidCcStateTransition)` if the entry is settled
    pub fn toggle_billed(
        entry_id: Uuid,
        snapshot: &CcSnapshot,
        now: DateTime<Utc>,
    ) -> Result<CcTransition, LedgerError> {
        if !snapshot.is_cc_payment || snapshot.settlement_intent.is_none() {
            return Err(LedgerError::NotCcTransaction(entry_id));
        }

        match snapshot.state() {
            CcState::Pending => Ok(CcTransition {
                from: CcState::Pending,
                to: CcState::Billed,
                billed_at: Some(now),
            }),
            CcState::Billed => Ok(CcTransition {
                from: CcState::Billed,
                to: CcState::Pending,
                billed_at: None,
            }),
            CcState::Settled => Err(LedgerError::InvalidCcStateTransition {
                from: CcState::Settled,
                to: if snapshot.billed_at.is_some() {
                    CcState::Pending
                } else {
                    CcState::Billed
                },
            }),
        }
    }

    /// Validates a settlement-intent change given as raw text.
    ///
    /// Checks run in order: CC entry, not yet paid, then the value itself.
    pub fn update_settlement_intent(
        snapshot: &CcSnapshot,
        intent: &str,
    ) -> Result<SettlementIntent, LedgerError> {
        Self::ensure_intent_mutable(snapshot)?;
        SettlementIntent::parse(intent)
    }

    /// Fails unless the entry's settlement intent may still change.
    pub fn ensure_intent_mutable(snapshot: &CcSnapshot) -> Result<(), LedgerError> {
        if !snapshot.is_cc_payment {
            return Err(LedgerError::SettlementIntentNotApplicable);
        }
        if snapshot.state().is_terminal() {
            return Err(LedgerError::TransactionAlreadyPaid);
        }
        Ok(())
    }

    /// Normalizes the ids of an atomic settlement.
    pub fn settlement_ids(ids: &[Uuid]) -> Result<Vec<Uuid>, LedgerError> {
        normalize_batch_ids(ids)
    }

    /// Checks that the bulk settle touched exactly the requested rows.
    ///
    /// A mismatch means stale, foreign, non-CC or already settled ids, and the
    /// caller must abort the whole unit.
    pub fn verify_settled_count(expected: usize, matched: u64) -> Result<(), LedgerError> {
        if u64::try_from(expected).ok() != Some(matched) {
            return Err(LedgerError::TransactionsNotFound { expected, matched });
        }
        Ok(())
    }
}
