//! Recurring repository: templates and the projection regenerator.
//!
//! Projections are ledger entries with `is_projected = true` and a
//! `projection_key` of `"<template_id>:<YYYY-MM>"`. Editing one through the
//! ledger store materializes it; regeneration never touches materialized rows.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use tracing::{debug, error, info};
use uuid::Uuid;

use ledgerly_core::ledger::{CcFields, EntryType};
use ledgerly_core::recurring::{
    DeleteTemplateResult, GenerationResult, RecurringError, RecurringService,
    UpdateTemplateResult,
};
use ledgerly_shared::types::YearMonth;

use super::is_unique_violation;
use super::ledger::{CreateEntryInput, EntryOrigin, entry_active_model};
use crate::entities::{ledger_entries, recurring_templates};
use crate::unit_of_work::UnitOfWorkExt;

/// Input for creating a recurring template.
#[derive(Debug, Clone)]
pub struct CreateTemplateInput {
    /// Name, also used as the description of projections.
    pub name: String,
    /// `income` or `expense`.
    pub entry_type: String,
    /// Amount per occurrence, minor units.
    pub amount_minor: i64,
    /// Day of month, clamped to short months.
    pub due_day: u32,
    /// Category of projections.
    pub category_id: Option<Uuid>,
    /// Account of projections.
    pub account_id: Option<Uuid>,
    /// First date the template applies to.
    pub starts_on: Option<NaiveDate>,
    /// Last date the template applies to.
    pub ends_on: Option<NaiveDate>,
}

/// Input for editing a template. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateTemplateInput {
    /// New name.
    pub name: Option<String>,
    /// New entry type.
    pub entry_type: Option<String>,
    /// New amount.
    pub amount_minor: Option<i64>,
    /// New due day.
    pub due_day: Option<u32>,
    /// New category.
    pub category_id: Option<Uuid>,
    /// New account.
    pub account_id: Option<Uuid>,
    /// New start date.
    pub starts_on: Option<NaiveDate>,
    /// New end date.
    pub ends_on: Option<NaiveDate>,
    /// Pause or resume generation.
    pub is_active: Option<bool>,
}

/// Maps a storage failure to [`RecurringError::Database`], logging its context.
fn storage_error(
    workspace_id: Uuid,
    template_id: Option<Uuid>,
    operation: &'static str,
) -> impl FnOnce(DbErr) -> RecurringError {
    move |err| {
        error!(%workspace_id, ?template_id, operation, error = %err, "recurring storage failure");
        RecurringError::Database(err.to_string())
    }
}

fn due_day_of(template: &recurring_templates::Model) -> u32 {
    u32::try_from(template.due_day).unwrap_or(1)
}

async fn find_template<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    template_id: Uuid,
) -> Result<recurring_templates::Model, RecurringError> {
    recurring_templates::Entity::find_by_id(template_id)
        .filter(recurring_templates::Column::WorkspaceId.eq(workspace_id))
        .filter(recurring_templates::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .map_err(storage_error(workspace_id, Some(template_id), "find_template"))?
        .ok_or(RecurringError::TemplateNotFound(template_id))
}

/// Hard-deletes every projected child of a template, soft-deleted ones included.
async fn delete_projections<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    template_id: Uuid,
) -> Result<u64, RecurringError> {
    ledger_entries::Entity::delete_many()
        .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
        .filter(ledger_entries::Column::TemplateId.eq(template_id))
        .filter(ledger_entries::Column::IsProjected.eq(true))
        .exec(conn)
        .await
        .map(|result| result.rows_affected)
        .map_err(storage_error(workspace_id, Some(template_id), "delete_projections"))
}

/// Inserts the projection of `template` for `month`.
///
/// Returns `None` when the projection key is already taken, which happens
/// when a concurrent pass generated the month first.
async fn insert_projection<C: ConnectionTrait>(
    conn: &C,
    template: &recurring_templates::Model,
    month: YearMonth,
    now: DateTimeWithTimeZone,
) -> Result<Option<Uuid>, RecurringError> {
    let workspace_id = template.workspace_id;
    let key = RecurringService::projection_key(template.id, month);
    let mut input = CreateEntryInput::new(
        template.entry_type.into(),
        template.amount_minor,
        template.name.clone(),
        RecurringService::due_date(month, due_day_of(template)),
    );
    input.category_id = template.category_id;
    input.account_id = template.account_id;

    let inserted = entry_active_model(
        workspace_id,
        input,
        CcFields {
            is_cc_payment: false,
            settlement_intent: None,
        },
        EntryOrigin::projection(template.id, key),
        now,
    )
    .insert(conn)
    .await;

    match inserted {
        Ok(entry) => Ok(Some(entry.id)),
        Err(err) if is_unique_violation(&err) => {
            debug!(%workspace_id, template_id = %template.id, %month, "projection created concurrently");
            Ok(None)
        }
        Err(err) => Err(storage_error(workspace_id, Some(template.id), "insert_projection")(err)),
    }
}

/// Recurring repository for templates and projection generation.
#[derive(Debug, Clone)]
pub struct RecurringRepository {
    db: DatabaseConnection,
}

impl RecurringRepository {
    /// Creates a new recurring repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a template.
    pub async fn create_template(
        &self,
        workspace_id: Uuid,
        input: CreateTemplateInput,
    ) -> Result<recurring_templates::Model, RecurringError> {
        let spec = RecurringService::validate_template(
            &input.name,
            &input.entry_type,
            input.amount_minor,
            input.due_day,
            input.starts_on,
            input.ends_on,
        )?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let template = recurring_templates::ActiveModel {
            id: Set(Uuid::now_v7()),
            workspace_id: Set(workspace_id),
            name: Set(spec.name),
            entry_type: Set(spec.entry_type.into()),
            amount_minor: Set(spec.amount_minor),
            due_day: Set(i32::try_from(spec.due_day).unwrap_or(1)),
            category_id: Set(input.category_id),
            account_id: Set(input.account_id),
            is_active: Set(true),
            starts_on: Set(spec.starts_on),
            ends_on: Set(spec.ends_on),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(storage_error(workspace_id, None, "create_template"))?;

        info!(%workspace_id, template_id = %template.id, "recurring template created");
        Ok(template)
    }

    /// Gets a live template by id.
    pub async fn get_template(
        &self,
        workspace_id: Uuid,
        template_id: Uuid,
    ) -> Result<recurring_templates::Model, RecurringError> {
        find_template(&self.db, workspace_id, template_id).await
    }

    /// Lists live templates by name.
    pub async fn list_templates(
        &self,
        workspace_id: Uuid,
    ) -> Result<Vec<recurring_templates::Model>, RecurringError> {
        recurring_templates::Entity::find()
            .filter(recurring_templates::Column::WorkspaceId.eq(workspace_id))
            .filter(recurring_templates::Column::DeletedAt.is_null())
            .order_by_asc(recurring_templates::Column::Name)
            .order_by_asc(recurring_templates::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "list_templates"))
    }

    /// Edits a template and drops its projections so they regenerate.
    ///
    /// Materialized children (`is_projected = false`) are untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The template is not found
    /// - The merged template fails validation
    /// - Database operation fails
    pub async fn update_template(
        &self,
        workspace_id: Uuid,
        template_id: Uuid,
        input: UpdateTemplateInput,
    ) -> Result<(recurring_templates::Model, UpdateTemplateResult), RecurringError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(template_id), "begin_update_template"))?;
        let current = find_template(uow.conn(), workspace_id, template_id).await?;

        let current_type = EntryType::from(current.entry_type);
        let spec = RecurringService::validate_template(
            input.name.as_deref().unwrap_or(&current.name),
            input
                .entry_type
                .as_deref()
                .unwrap_or_else(|| current_type.as_str()),
            input.amount_minor.unwrap_or(current.amount_minor),
            input.due_day.unwrap_or_else(|| due_day_of(&current)),
            input.starts_on.or(current.starts_on),
            input.ends_on.or(current.ends_on),
        )?;

        let projections_deleted = delete_projections(uow.conn(), workspace_id, template_id).await?;

        let mut active: recurring_templates::ActiveModel = current.into();
        active.name = Set(spec.name);
        active.entry_type = Set(spec.entry_type.into());
        active.amount_minor = Set(spec.amount_minor);
        active.due_day = Set(i32::try_from(spec.due_day).unwrap_or(1));
        active.starts_on = Set(spec.starts_on);
        active.ends_on = Set(spec.ends_on);
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(account_id) = input.account_id {
            active.account_id = Set(Some(account_id));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let template = active
            .update(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(template_id), "update_template"))?;

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(template_id), "commit_update_template"))?;

        info!(%workspace_id, %template_id, projections_deleted, "recurring template updated");
        Ok((
            template,
            UpdateTemplateResult {
                template_id,
                projections_deleted,
            },
        ))
    }

    /// Deletes projections, orphans actuals, then soft-deletes the template.
    pub async fn delete_template(
        &self,
        workspace_id: Uuid,
        template_id: Uuid,
    ) -> Result<DeleteTemplateResult, RecurringError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(template_id), "begin_delete_template"))?;
        let template = find_template(uow.conn(), workspace_id, template_id).await?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let projections_deleted = delete_projections(uow.conn(), workspace_id, template_id).await?;

        let actuals_orphaned = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::TemplateId, Expr::value(Option::<Uuid>::None))
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::TemplateId.eq(template_id))
            .exec(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(template_id), "orphan_actuals"))?
            .rows_affected;

        let mut active: recurring_templates::ActiveModel = template.into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active
            .update(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(template_id), "soft_delete_template"))?;

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(template_id), "commit_delete_template"))?;

        info!(
            %workspace_id,
            %template_id,
            projections_deleted,
            actuals_orphaned,
            "recurring template deleted"
        );
        Ok(DeleteTemplateResult {
            template_id,
            projections_deleted,
            actuals_orphaned,
        })
    }

    /// Creates the missing projections of every due template for `month`.
    ///
    /// A template is skipped when any entry of it already exists for the
    /// month, deleted or not, or when a concurrent pass inserts the same
    /// projection key first.
    pub async fn generate_for_month(
        &self,
        workspace_id: Uuid,
        month: YearMonth,
    ) -> Result<GenerationResult, RecurringError> {
        let templates: Vec<recurring_templates::Model> = self
            .list_templates(workspace_id)
            .await?
            .into_iter()
            .filter(|t| RecurringService::is_due_in(&t.window(), month))
            .collect();

        let mut result = GenerationResult::for_month(month);
        if templates.is_empty() {
            return Ok(result);
        }

        let generated = self.generated_templates(workspace_id, month, &templates).await?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        for template in templates {
            if generated.contains(&template.id) {
                result.skipped_templates.push(template.id);
                continue;
            }

            match insert_projection(&self.db, &template, month, now).await? {
                Some(entry_id) => result.created_entry_ids.push(entry_id),
                None => result.skipped_templates.push(template.id),
            }
        }

        info!(
            %workspace_id,
            %month,
            created = result.created_count(),
            skipped = result.skipped_templates.len(),
            "recurring projections generated"
        );
        Ok(result)
    }

    /// Templates that already have an entry in `month`, deleted ones included.
    async fn generated_templates(
        &self,
        workspace_id: Uuid,
        month: YearMonth,
        templates: &[recurring_templates::Model],
    ) -> Result<HashSet<Uuid>, RecurringError> {
        let keys: Vec<String> = templates
            .iter()
            .map(|t| RecurringService::projection_key(t.id, month))
            .collect();

        let existing = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::TemplateId.is_in(templates.iter().map(|t| t.id)))
            .filter(
                Condition::any()
                    .add(ledger_entries::Column::ProjectionKey.is_in(keys))
                    .add(
                        ledger_entries::Column::EntryDate
                            .between(month.first_day(), month.last_day()),
                    ),
            )
            .all(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "find_generated"))?;

        Ok(existing.into_iter().filter_map(|e| e.template_id).collect())
    }
}

#[cfg(test)]
#[path = "recurring_tests.rs"]
mod tests;
