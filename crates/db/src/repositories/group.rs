//! Group repository: manual groups, auto-detection and the two delete paths.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use ledgerly_core::grouping::{
    AutoGroupPlan, DetectionCandidate, GroupError, GroupTotals, GroupingService,
};
use ledgerly_shared::types::YearMonth;

use super::is_unique_violation;
use crate::entities::{
    ledger_entries, loan_payments, loan_providers, loans, sea_orm_active_enums, transaction_groups,
};
use crate::unit_of_work::UnitOfWorkExt;

/// Input for creating a manual group.
#[derive(Debug, Clone)]
pub struct CreateGroupInput {
    /// Display name.
    pub name: String,
    /// Month the group belongs to.
    pub month: YearMonth,
    /// Live entries to assign.
    pub entry_ids: Vec<Uuid>,
}

/// A group with totals computed from its live children.
#[derive(Debug, Clone, Serialize)]
pub struct GroupWithTotals {
    /// The group row.
    pub group: transaction_groups::Model,
    /// Sum and count of live children.
    pub totals: GroupTotals,
}

/// Outcome of one auto-detection pass.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    /// Month that was scanned.
    pub month: YearMonth,
    /// Groups created by this pass.
    pub created: Vec<GroupWithTotals>,
    /// Providers that already had a group for the month.
    pub skipped_providers: Vec<Uuid>,
}

enum PlanOutcome {
    Created(GroupWithTotals),
    Skipped,
}

/// Maps a storage failure to [`GroupError::Database`], logging its context.
fn storage_error(
    workspace_id: Uuid,
    group_id: Option<Uuid>,
    operation: &'static str,
) -> impl FnOnce(DbErr) -> GroupError {
    move |err| {
        error!(%workspace_id, ?group_id, operation, error = %err, "group storage failure");
        GroupError::Database(err.to_string())
    }
}

async fn find_group<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    group_id: Uuid,
) -> Result<transaction_groups::Model, GroupError> {
    transaction_groups::Entity::find_by_id(group_id)
        .filter(transaction_groups::Column::WorkspaceId.eq(workspace_id))
        .one(conn)
        .await
        .map_err(storage_error(workspace_id, Some(group_id), "find_group"))?
        .ok_or(GroupError::NotFound(group_id))
}

/// Totals of the given groups, from their live children.
async fn totals_for<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    group_ids: &[Uuid],
) -> Result<HashMap<Uuid, GroupTotals>, GroupError> {
    if group_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Option<Uuid>, i64)> = ledger_entries::Entity::find()
        .select_only()
        .column(ledger_entries::Column::GroupId)
        .column(ledger_entries::Column::AmountMinor)
        .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
        .filter(ledger_entries::Column::GroupId.is_in(group_ids.iter().copied()))
        .filter(ledger_entries::Column::DeletedAt.is_null())
        .into_tuple()
        .all(conn)
        .await
        .map_err(storage_error(workspace_id, None, "group_totals"))?;

    let mut amounts: HashMap<Uuid, Vec<i64>> = HashMap::new();
    for (group_id, amount) in rows {
        if let Some(group_id) = group_id {
            amounts.entry(group_id).or_default().push(amount);
        }
    }

    group_ids
        .iter()
        .map(|id| {
            let totals = match amounts.get(id) {
                Some(a) => GroupingService::totals(a)?,
                None => GroupTotals::default(),
            };
            Ok((*id, totals))
        })
        .collect()
}

async fn with_totals<C: ConnectionTrait>(
    conn: &C,
    group: transaction_groups::Model,
) -> Result<GroupWithTotals, GroupError> {
    let totals = totals_for(conn, group.workspace_id, &[group.id])
        .await?
        .remove(&group.id)
        .unwrap_or_default();
    Ok(GroupWithTotals { group, totals })
}

/// Points the listed live entries at `group_id`, failing unless all matched.
///
/// With `only_ungrouped`, entries already in a group do not match.
async fn assign_entries<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    group_id: Uuid,
    entry_ids: &[Uuid],
    only_ungrouped: bool,
    now: DateTimeWithTimeZone,
) -> Result<(), GroupError> {
    let mut update = ledger_entries::Entity::update_many();
    if only_ungrouped {
        update = update.filter(ledger_entries::Column::GroupId.is_null());
    }
    let result = update
        .col_expr(ledger_entries::Column::GroupId, Expr::value(Some(group_id)))
        .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
        .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
        .filter(ledger_entries::Column::Id.is_in(entry_ids.iter().copied()))
        .filter(ledger_entries::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .map_err(storage_error(workspace_id, Some(group_id), "assign_entries"))?;

    let found = usize::try_from(result.rows_affected).unwrap_or(usize::MAX);
    GroupingService::verify_entries_found(entry_ids.len(), found)
}

/// Inserts the auto-detected group of a plan.
///
/// Returns `None` when the plan's key is already taken, which happens when a
/// concurrent pass created the group first.
async fn insert_auto_group<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    plan: &AutoGroupPlan,
    now: DateTimeWithTimeZone,
) -> Result<Option<transaction_groups::Model>, GroupError> {
    let inserted = transaction_groups::ActiveModel {
        id: Set(Uuid::now_v7()),
        workspace_id: Set(workspace_id),
        name: Set(plan.name.clone()),
        month: Set(plan.month.to_string()),
        auto_detected: Set(true),
        loan_provider_id: Set(Some(plan.provider_id)),
        auto_detect_key: Set(Some(plan.auto_detect_key.clone())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await;

    match inserted {
        Ok(group) => Ok(Some(group)),
        Err(err) if is_unique_violation(&err) => {
            debug!(%workspace_id, key = %plan.auto_detect_key, "auto group created concurrently");
            Ok(None)
        }
        Err(err) => Err(storage_error(workspace_id, None, "insert_auto_group")(err)),
    }
}

/// Group repository for transaction groups and auto-detection.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    db: DatabaseConnection,
}

impl GroupRepository {
    /// Creates a new group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a manual group and assigns entries to it as one unit.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is blank or too long
    /// - No ids are given, or more than the batch cap
    /// - Any id is not a live entry of the workspace
    /// - Database operation fails
    pub async fn create_group(
        &self,
        workspace_id: Uuid,
        input: CreateGroupInput,
    ) -> Result<GroupWithTotals, GroupError> {
        let name = GroupingService::validate_group_name(&input.name)?;
        let entry_ids = GroupingService::normalize_entry_ids(&input.entry_ids)?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, None, "begin_create_group"))?;

        let group = transaction_groups::ActiveModel {
            id: Set(Uuid::now_v7()),
            workspace_id: Set(workspace_id),
            name: Set(name),
            month: Set(input.month.to_string()),
            auto_detected: Set(false),
            loan_provider_id: Set(None),
            auto_detect_key: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(uow.conn())
        .await
        .map_err(storage_error(workspace_id, None, "insert_group"))?;

        assign_entries(uow.conn(), workspace_id, group.id, &entry_ids, false, now)
            .await
            .inspect_err(|err| {
                warn!(%workspace_id, group_id = %group.id, error = %err, "group assignment rejected");
            })?;

        let created = with_totals(uow.conn(), group).await?;
        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(created.group.id), "commit_create_group"))?;

        info!(
            %workspace_id,
            group_id = %created.group.id,
            children = created.totals.child_count,
            "group created"
        );
        Ok(created)
    }

    /// Gets a group with its computed totals.
    pub async fn get_with_totals(
        &self,
        workspace_id: Uuid,
        group_id: Uuid,
    ) -> Result<GroupWithTotals, GroupError> {
        let group = find_group(&self.db, workspace_id, group_id).await?;
        with_totals(&self.db, group).await
    }

    /// Lists groups with computed totals, optionally for one month.
    pub async fn list_with_totals(
        &self,
        workspace_id: Uuid,
        month: Option<YearMonth>,
    ) -> Result<Vec<GroupWithTotals>, GroupError> {
        let mut query = transaction_groups::Entity::find()
            .filter(transaction_groups::Column::WorkspaceId.eq(workspace_id));
        if let Some(month) = month {
            query = query.filter(transaction_groups::Column::Month.eq(month.to_string()));
        }

        let groups = query
            .order_by_desc(transaction_groups::Column::Month)
            .order_by_asc(transaction_groups::Column::Name)
            .order_by_asc(transaction_groups::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "list_groups"))?;

        let ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
        let mut totals = totals_for(&self.db, workspace_id, &ids).await?;

        Ok(groups
            .into_iter()
            .map(|group| {
                let totals = totals.remove(&group.id).unwrap_or_default();
                GroupWithTotals { group, totals }
            })
            .collect())
    }

    /// Detaches entries from a group. Returns the number detached.
    pub async fn remove_entries(
        &self,
        workspace_id: Uuid,
        group_id: Uuid,
        entry_ids: &[Uuid],
    ) -> Result<u64, GroupError> {
        let entry_ids = GroupingService::normalize_entry_ids(entry_ids)?;
        find_group(&self.db, workspace_id, group_id).await?;

        let result = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::GroupId, Expr::value(Option::<Uuid>::None))
            .col_expr(
                ledger_entries::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::GroupId.eq(group_id))
            .filter(ledger_entries::Column::Id.is_in(entry_ids))
            .exec(&self.db)
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "remove_entries"))?;

        debug!(%workspace_id, %group_id, removed = result.rows_affected, "entries removed from group");
        Ok(result.rows_affected)
    }

    /// Deletes the group and keeps its children. Returns the number released.
    pub async fn ungroup(&self, workspace_id: Uuid, group_id: Uuid) -> Result<u64, GroupError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "begin_ungroup"))?;
        find_group(uow.conn(), workspace_id, group_id).await?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let released = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::GroupId, Expr::value(Option::<Uuid>::None))
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::GroupId.eq(group_id))
            .exec(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "release_children"))?
            .rows_affected;

        transaction_groups::Entity::delete_by_id(group_id)
            .exec(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "delete_group"))?;

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "commit_ungroup"))?;

        info!(%workspace_id, %group_id, released, "group ungrouped");
        Ok(released)
    }

    /// Soft-deletes every live child, then deletes the group.
    ///
    /// Returns the number of children soft-deleted.
    pub async fn cascade_delete(
        &self,
        workspace_id: Uuid,
        group_id: Uuid,
    ) -> Result<u64, GroupError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "begin_cascade_delete"))?;
        find_group(uow.conn(), workspace_id, group_id).await?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let deleted = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::GroupId.eq(group_id))
            .filter(ledger_entries::Column::DeletedAt.is_null())
            .exec(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "soft_delete_children"))?
            .rows_affected;

        // Soft-deleted rows keep no dangling group reference.
        ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::GroupId, Expr::value(Option::<Uuid>::None))
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::GroupId.eq(group_id))
            .exec(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "detach_children"))?;

        transaction_groups::Entity::delete_by_id(group_id)
            .exec(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "delete_group"))?;

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(group_id), "commit_cascade_delete"))?;

        info!(%workspace_id, %group_id, deleted, "group cascade deleted");
        Ok(deleted)
    }

    /// Groups each consolidated provider's ungrouped loan entries for `month`.
    ///
    /// Providers with fewer than two candidates are ignored. A provider that
    /// already has an auto-detected group for the month is skipped, including
    /// when a concurrent pass creates it first. A provider whose candidates
    /// were grouped elsewhere after they were read is skipped too. Each group
    /// is created with its assignments in its own unit of work.
    pub async fn detect_and_group(
        &self,
        workspace_id: Uuid,
        month: YearMonth,
    ) -> Result<DetectionResult, GroupError> {
        let candidates = self.detection_candidates(workspace_id, month).await?;
        let plans = GroupingService::plan_auto_groups(month, candidates);
        self.apply_plans(workspace_id, month, plans).await
    }

    async fn apply_plans(
        &self,
        workspace_id: Uuid,
        month: YearMonth,
        plans: Vec<AutoGroupPlan>,
    ) -> Result<DetectionResult, GroupError> {
        let mut result = DetectionResult {
            month,
            created: Vec::new(),
            skipped_providers: Vec::new(),
        };
        for plan in plans {
            let provider_id = plan.provider_id;
            match self.apply_plan(workspace_id, plan).await? {
                PlanOutcome::Created(group) => result.created.push(group),
                PlanOutcome::Skipped => result.skipped_providers.push(provider_id),
            }
        }

        info!(
            %workspace_id,
            %month,
            created = result.created.len(),
            skipped = result.skipped_providers.len(),
            "auto-detection finished"
        );
        Ok(result)
    }

    /// Ungrouped live loan entries of consolidated providers due in `month`.
    async fn detection_candidates(
        &self,
        workspace_id: Uuid,
        month: YearMonth,
    ) -> Result<Vec<DetectionCandidate>, GroupError> {
        let providers: HashMap<Uuid, String> = loan_providers::Entity::find()
            .filter(loan_providers::Column::WorkspaceId.eq(workspace_id))
            .filter(
                loan_providers::Column::PaymentMode
                    .eq(sea_orm_active_enums::PaymentMode::ConsolidatedMonthly),
            )
            .filter(loan_providers::Column::DeletedAt.is_null())
            .all(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "detect_providers"))?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        if providers.is_empty() {
            return Ok(Vec::new());
        }

        let loan_providers: HashMap<Uuid, Uuid> = loans::Entity::find()
            .filter(loans::Column::WorkspaceId.eq(workspace_id))
            .filter(loans::Column::ProviderId.is_in(providers.keys().copied()))
            .filter(loans::Column::DeletedAt.is_null())
            .all(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "detect_loans"))?
            .into_iter()
            .map(|l| (l.id, l.provider_id))
            .collect();
        if loan_providers.is_empty() {
            return Ok(Vec::new());
        }

        let payment_providers: HashMap<Uuid, Uuid> = loan_payments::Entity::find()
            .filter(loan_payments::Column::WorkspaceId.eq(workspace_id))
            .filter(loan_payments::Column::LoanId.is_in(loan_providers.keys().copied()))
            .filter(loan_payments::Column::DueYear.eq(month.year()))
            .filter(loan_payments::Column::DueMonth.eq(i32::try_from(month.month()).unwrap_or(0)))
            .all(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "detect_payments"))?
            .into_iter()
            .filter_map(|p| Some((p.id, *loan_providers.get(&p.loan_id)?)))
            .collect();
        if payment_providers.is_empty() {
            return Ok(Vec::new());
        }

        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::Source.eq(sea_orm_active_enums::EntrySource::Loan))
            .filter(ledger_entries::Column::LoanPaymentId.is_in(payment_providers.keys().copied()))
            .filter(ledger_entries::Column::GroupId.is_null())
            .filter(ledger_entries::Column::DeletedAt.is_null())
            .order_by_asc(ledger_entries::Column::EntryDate)
            .order_by_asc(ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "detect_entries"))?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let provider_id = *payment_providers.get(&entry.loan_payment_id?)?;
                Some(DetectionCandidate {
                    entry_id: entry.id,
                    provider_id,
                    provider_name: providers.get(&provider_id)?.clone(),
                })
            })
            .collect())
    }

    async fn apply_plan(
        &self,
        workspace_id: Uuid,
        plan: AutoGroupPlan,
    ) -> Result<PlanOutcome, GroupError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, None, "begin_auto_group"))?;

        let existing = transaction_groups::Entity::find()
            .filter(transaction_groups::Column::WorkspaceId.eq(workspace_id))
            .filter(transaction_groups::Column::AutoDetectKey.eq(plan.auto_detect_key.as_str()))
            .one(uow.conn())
            .await
            .map_err(storage_error(workspace_id, None, "find_auto_group"))?;
        if let Some(group) = existing {
            debug!(%workspace_id, group_id = %group.id, key = %plan.auto_detect_key, "auto group exists");
            return Ok(PlanOutcome::Skipped);
        }

        let now: DateTimeWithTimeZone = Utc::now().into();
        let Some(group) = insert_auto_group(uow.conn(), workspace_id, &plan, now).await? else {
            return Ok(PlanOutcome::Skipped);
        };

        // Candidates grouped since detection read them leave this plan short.
        match assign_entries(uow.conn(), workspace_id, group.id, &plan.entry_ids, true, now).await
        {
            Ok(()) => {}
            Err(err @ GroupError::EntriesNotFound { .. }) => {
                warn!(
                    %workspace_id,
                    provider_id = %plan.provider_id,
                    error = %err,
                    "auto group candidates changed, skipping provider"
                );
                return Ok(PlanOutcome::Skipped);
            }
            Err(err) => return Err(err),
        }
        let created = with_totals(uow.conn(), group).await?;
        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(created.group.id), "commit_auto_group"))?;

        Ok(PlanOutcome::Created(created))
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
