//! Input validation for ledger entries and batch operations.

use chrono::NaiveDate;
use std::collections::HashSet;
use uuid::Uuid;

use super::error::LedgerError;

/// Upper bound on ids accepted by any batch mutation.
pub const MAX_BATCH_SIZE: usize = 100;

/// Largest amount accepted on a single entry, payment or template, in minor units.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000_000;

/// Validates that an amount in minor units is positive and within [`MAX_AMOUNT_MINOR`].
pub fn validate_amount(amount_minor: i64) -> Result<(), LedgerError> {
    if amount_minor <= 0 {
        return Err(LedgerError::NonPositiveAmount(amount_minor));
    }
    if amount_minor > MAX_AMOUNT_MINOR {
        return Err(LedgerError::AmountTooLarge {
            max: MAX_AMOUNT_MINOR,
            actual: amount_minor,
        });
    }
    Ok(())
}

/// Sums amounts, or `None` if the total does not fit in an `i64`.
pub fn checked_total<I>(amounts: I) -> Option<i64>
where
    I: IntoIterator<Item = i64>,
{
    amounts
        .into_iter()
        .try_fold(0_i64, |total, amount| total.checked_add(amount))
}

/// Trims a description and rejects blank ones.
pub fn normalize_description(description: &str) -> Result<String, LedgerError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

/// Validates an optional inclusive date range.
pub fn validate_date_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<(), LedgerError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(LedgerError::InvalidDateRange),
        _ => Ok(()),
    }
}

/// Collapses duplicate ids (first occurrence wins) and enforces the batch cap.
pub fn normalize_batch_ids(ids: &[Uuid]) -> Result<Vec<Uuid>, LedgerError> {
    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

    if unique.is_empty() {
        return Err(LedgerError::EmptyBatch);
    }
    if unique.len() > MAX_BATCH_SIZE {
        return Err(LedgerError::BatchTooLarge {
            max: MAX_BATCH_SIZE,
            actual: unique.len(),
        });
    }
    Ok(unique)
}
