//! Grouping service: auto-detection planning and group validation.

use std::collections::{BTreeMap, HashSet};

use ledgerly_shared::types::YearMonth;
use uuid::Uuid;

use super::error::GroupError;
use super::types::{AutoGroupPlan, DetectionCandidate, GroupTotals};
use crate::ledger::{MAX_BATCH_SIZE, checked_total};

/// Fewest ungrouped entries that make an auto-detected group.
pub const MIN_AUTO_GROUP_SIZE: usize = 2;

/// Longest accepted group name, in characters.
pub const MAX_GROUP_NAME_LEN: usize = 100;

/// Stateless service for grouping rules.
pub struct GroupingService;

impl GroupingService {
    /// Name of the auto-detected group for a provider and month.
    #[must_use]
    pub fn auto_group_name(provider_name: &str, month: YearMonth) -> String {
        format!("{} {month}", provider_name.trim())
    }

    /// Store-level uniqueness key of an auto-detected group.
    #[must_use]
    pub fn auto_detect_key(provider_id: Uuid, month: YearMonth) -> String {
        format!("{provider_id}:{month}")
    }

    /// Groups candidates by provider and keeps providers with enough entries.
    ///
    /// Plans come out ordered by provider id; duplicate entries are dropped.
    #[must_use]
    pub fn plan_auto_groups(
        month: YearMonth,
        candidates: Vec<DetectionCandidate>,
    ) -> Vec<AutoGroupPlan> {
        let mut by_provider: BTreeMap<Uuid, (String, Vec<Uuid>)> = BTreeMap::new();
        let mut seen = HashSet::new();

        for candidate in candidates {
            if !seen.insert(candidate.entry_id) {
                continue;
            }
            by_provider
                .entry(candidate.provider_id)
                .or_insert_with(|| (candidate.provider_name.clone(), Vec::new()))
                .1
                .push(candidate.entry_id);
        }

        by_provider
            .into_iter()
            .filter(|(_, (_, ids))| ids.len() >= MIN_AUTO_GROUP_SIZE)
            .map(|(provider_id, (provider_name, entry_ids))| AutoGroupPlan {
                provider_id,
                name: Self::auto_group_name(&provider_name, month),
                month,
                auto_detect_key: Self::auto_detect_key(provider_id, month),
                entry_ids,
            })
            .collect()
    }

    /// Trims a group name and enforces its bounds.
    pub fn validate_group_name(name: &str) -> Result<String, GroupError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(GroupError::EmptyName);
        }
        if trimmed.chars().count() > MAX_GROUP_NAME_LEN {
            return Err(GroupError::NameTooLong {
                max: MAX_GROUP_NAME_LEN,
            });
        }
        Ok(trimmed.to_string())
    }

    /// Dedupes entry ids and enforces the batch bounds.
    pub fn normalize_entry_ids(ids: &[Uuid]) -> Result<Vec<Uuid>, GroupError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        if unique.is_empty() {
            return Err(GroupError::EmptyEntries);
        }
        if unique.len() > MAX_BATCH_SIZE {
            return Err(GroupError::BatchTooLarge {
                max: MAX_BATCH_SIZE,
                actual: unique.len(),
            });
        }
        Ok(unique)
    }

    /// Checks that every requested entry was found.
    pub fn verify_entries_found(expected: usize, found: usize) -> Result<(), GroupError> {
        if expected != found {
            return Err(GroupError::EntriesNotFound { expected, found });
        }
        Ok(())
    }

    /// Sums live child amounts.
    pub fn totals(amounts: &[i64]) -> Result<GroupTotals, GroupError> {
        Ok(GroupTotals {
            total_amount_minor: checked_total(amounts.iter().copied())
                .ok_or(GroupError::TotalOverflow)?,
            child_count: amounts.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn candidate(provider_id: Uuid, name: &str) -> DetectionCandidate {
        DetectionCandidate {
            entry_id: Uuid::new_v4(),
            provider_id,
            provider_name: name.to_string(),
        }
    }

    #[test]
    fn test_plan_requires_two_entries_per_provider() {
        let bank = Uuid::new_v4();
        let shop = Uuid::new_v4();
        let month = ym("2026-05");
        let candidates = vec![
            candidate(bank, "Bank"),
            candidate(shop, "Shop"),
            candidate(bank, "Bank"),
            candidate(bank, "Bank"),
        ];

        let plans = GroupingService::plan_auto_groups(month, candidates);
        assert_eq!(plans.len(), 1);
        let plan = &plans[0];
        assert_eq!(plan.provider_id, bank);
        assert_eq!(plan.entry_ids.len(), 3);
        assert_eq!(plan.name, "Bank 2026-05");
        assert_eq!(plan.auto_detect_key, format!("{bank}:2026-05"));
    }

    #[test]
    fn test_plan_ignores_duplicate_entries() {
        let bank = Uuid::new_v4();
        let dup = candidate(bank, "Bank");
        let plans =
            GroupingService::plan_auto_groups(ym("2026-05"), vec![dup.clone(), dup]);
        assert!(plans.is_empty());
    }

    #[test]
    fn test_validate_group_name() {
        assert_eq!(
            GroupingService::validate_group_name("  Utilities ").unwrap(),
            "Utilities"
        );
        assert!(matches!(
            GroupingService::validate_group_name(" "),
            Err(GroupError::EmptyName)
        ));
        assert!(matches!(
            GroupingService::validate_group_name(&"x".repeat(101)),
            Err(GroupError::NameTooLong { max: 100 })
        ));
    }

    #[test]
    fn test_normalize_entry_ids() {
        let id = Uuid::new_v4();
        assert_eq!(
            GroupingService::normalize_entry_ids(&[id, id]).unwrap(),
            vec![id]
        );
        assert!(matches!(
            GroupingService::normalize_entry_ids(&[]),
            Err(GroupError::EmptyEntries)
        ));
        let many: Vec<Uuid> = (0..101).map(|_| Uuid::new_v4()).collect();
        assert!(matches!(
            GroupingService::normalize_entry_ids(&many),
            Err(GroupError::BatchTooLarge { .. })
        ));
    }

    #[test]
    fn test_totals() {
        let totals = GroupingService::totals(&[1_000, 2_500]).unwrap();
        assert_eq!(totals.total_amount_minor, 3_500);
        assert_eq!(totals.child_count, 2);
        assert_eq!(GroupingService::totals(&[]).unwrap(), GroupTotals::default());
        assert!(matches!(
            GroupingService::totals(&[i64::MAX, 1]),
            Err(GroupError::TotalOverflow)
        ));
    }
}
