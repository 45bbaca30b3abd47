//! Ledger repository: entry storage, the CC lifecycle and atomic settlement.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, UpdateMany,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use ledgerly_core::ledger::{
    CcFields, CcState, EntrySource, EntryType, LedgerError, LedgerService, SettlementIntent,
    checked_total, normalize_batch_ids, normalize_description, validate_amount,
    validate_date_range,
};
use ledgerly_shared::types::{PageRequest, PageResponse};

use crate::entities::{
    ledger_entries, loan_payments, loan_providers, loans, recurring_templates,
    sea_orm_active_enums, transaction_groups,
};
use crate::unit_of_work::UnitOfWorkExt;

/// Input for creating a ledger entry.
#[derive(Debug, Clone)]
pub struct CreateEntryInput {
    /// Income, expense or transfer.
    pub entry_type: EntryType,
    /// Amount in minor units, must be positive.
    pub amount_minor: i64,
    /// Description.
    pub description: String,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Paid flag.
    pub is_paid: bool,
    /// Optional category.
    pub category_id: Option<Uuid>,
    /// Optional source account.
    pub account_id: Option<Uuid>,
    /// Optional destination account for transfers.
    pub transfer_account_id: Option<Uuid>,
    /// Whether the entry is a credit-card charge.
    pub is_cc_payment: bool,
    /// Settlement intent; CC entries default to immediate.
    pub settlement_intent: Option<SettlementIntent>,
}

impl CreateEntryInput {
    /// An unpaid, uncategorized, non-CC entry.
    #[must_use]
    pub fn new(
        entry_type: EntryType,
        amount_minor: i64,
        description: impl Into<String>,
        entry_date: NaiveDate,
    ) -> Self {
        Self {
            entry_type,
            amount_minor,
            description: description.into(),
            entry_date,
            is_paid: false,
            category_id: None,
            account_id: None,
            transfer_account_id: None,
            is_cc_payment: false,
            settlement_intent: None,
        }
    }

    /// Marks the entry as a credit-card charge.
    #[must_use]
    pub fn credit_card(mut self, intent: Option<SettlementIntent>) -> Self {
        self.is_cc_payment = true;
        self.settlement_intent = intent;
        self
    }
}

/// Input for editing an entry. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateEntryInput {
    /// New amount.
    pub amount_minor: Option<i64>,
    /// New description.
    pub description: Option<String>,
    /// New date.
    pub entry_date: Option<NaiveDate>,
    /// New category.
    pub category_id: Option<Uuid>,
    /// New account.
    pub account_id: Option<Uuid>,
}

/// Filter options for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Filter by type.
    pub entry_type: Option<EntryType>,
    /// Filter by source.
    pub source: Option<EntrySource>,
    /// Filter by paid flag.
    pub is_paid: Option<bool>,
    /// Filter by derived CC state; implies CC entries only.
    pub cc_state: Option<CcState>,
    /// Inclusive start date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive end date.
    pub date_to: Option<NaiveDate>,
    /// Filter by group.
    pub group_id: Option<Uuid>,
    /// Filter by template.
    pub template_id: Option<Uuid>,
    /// Include projected entries.
    pub include_projected: bool,
}

/// Result of an atomic settlement.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementResult {
    /// The transfer entry that paid the card.
    pub transfer: ledger_entries::Model,
    /// Number of CC entries moved to settled.
    pub settled_count: u64,
}

/// Rows removed by a workspace clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearWorkspaceResult {
    /// Ledger entries.
    pub entries: u64,
    /// Transaction groups.
    pub groups: u64,
    /// Loan payments.
    pub payments: u64,
    /// Loans.
    pub loans: u64,
    /// Loan providers.
    pub providers: u64,
    /// Recurring templates.
    pub templates: u64,
}

/// Non-user fields of an entry created by one of the engines.
#[derive(Debug, Clone)]
pub(crate) struct EntryOrigin {
    pub source: EntrySource,
    pub template_id: Option<Uuid>,
    pub is_projected: bool,
    pub projection_key: Option<String>,
    pub loan_payment_id: Option<Uuid>,
}

impl EntryOrigin {
    pub(crate) const fn manual() -> Self {
        Self {
            source: EntrySource::Manual,
            template_id: None,
            is_projected: false,
            projection_key: None,
            loan_payment_id: None,
        }
    }

    pub(crate) fn projection(template_id: Uuid, projection_key: String) -> Self {
        Self {
            source: EntrySource::Recurring,
            template_id: Some(template_id),
            is_projected: true,
            projection_key: Some(projection_key),
            loan_payment_id: None,
        }
    }

    pub(crate) const fn loan(loan_payment_id: Uuid) -> Self {
        Self {
            source: EntrySource::Loan,
            template_id: None,
            is_projected: false,
            projection_key: None,
            loan_payment_id: Some(loan_payment_id),
        }
    }
}

/// Builds the active model of a new entry from already validated values.
pub(crate) fn entry_active_model(
    workspace_id: Uuid,
    input: CreateEntryInput,
    cc: CcFields,
    origin: EntryOrigin,
    now: DateTimeWithTimeZone,
) -> ledger_entries::ActiveModel {
    ledger_entries::ActiveModel {
        id: Set(Uuid::now_v7()),
        workspace_id: Set(workspace_id),
        entry_type: Set(input.entry_type.into()),
        amount_minor: Set(input.amount_minor),
        description: Set(input.description),
        entry_date: Set(input.entry_date),
        is_paid: Set(input.is_paid),
        category_id: Set(input.category_id),
        account_id: Set(input.account_id),
        transfer_account_id: Set(input.transfer_account_id),
        transfer_pair_id: Set(None),
        source: Set(origin.source.into()),
        template_id: Set(origin.template_id),
        is_projected: Set(origin.is_projected),
        projection_key: Set(origin.projection_key),
        loan_payment_id: Set(origin.loan_payment_id),
        group_id: Set(None),
        is_cc_payment: Set(cc.is_cc_payment),
        settlement_intent: Set(cc.settlement_intent.map(Into::into)),
        billed_at: Set(None),
        settled_at: Set(input.is_paid.then_some(now)),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// Maps a storage failure to [`LedgerError::Database`], logging its context.
fn storage_error(
    workspace_id: Uuid,
    entry_id: Option<Uuid>,
    operation: &'static str,
) -> impl FnOnce(DbErr) -> LedgerError {
    move |err| {
        error!(%workspace_id, ?entry_id, operation, error = %err, "ledger storage failure");
        LedgerError::Database(err.to_string())
    }
}

/// Loads a live entry of the workspace on `conn`.
async fn find_live_entry<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    entry_id: Uuid,
) -> Result<ledger_entries::Model, LedgerError> {
    ledger_entries::Entity::find_by_id(entry_id)
        .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
        .filter(ledger_entries::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .map_err(storage_error(workspace_id, Some(entry_id), "find_entry"))?
        .ok_or(LedgerError::TransactionNotFound(entry_id))
}

/// Update of one live entry that matches only while the entry is unpaid.
fn unpaid_entry_update(workspace_id: Uuid, entry_id: Uuid) -> UpdateMany<ledger_entries::Entity> {
    ledger_entries::Entity::update_many()
        .filter(ledger_entries::Column::Id.eq(entry_id))
        .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
        .filter(ledger_entries::Column::DeletedAt.is_null())
        .filter(ledger_entries::Column::IsPaid.eq(false))
}

/// Writes `billed_at` unless the entry was paid since it was read.
async fn write_billed_at<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    entry_id: Uuid,
    billed_at: Option<DateTimeWithTimeZone>,
    to: CcState,
) -> Result<(), LedgerError> {
    let changed = unpaid_entry_update(workspace_id, entry_id)
        .col_expr(ledger_entries::Column::BilledAt, Expr::value(billed_at))
        .col_expr(
            ledger_entries::Column::UpdatedAt,
            Expr::value(DateTimeWithTimeZone::from(Utc::now())),
        )
        .exec(conn)
        .await
        .map_err(storage_error(workspace_id, Some(entry_id), "toggle_billed"))?
        .rows_affected;
    if changed == 0 {
        warn!(%workspace_id, %entry_id, "toggle billed lost to a settlement");
        return Err(LedgerError::InvalidCcStateTransition {
            from: CcState::Settled,
            to,
        });
    }
    Ok(())
}

/// Writes the settlement intent unless the entry was paid since it was read.
async fn write_settlement_intent<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    entry_id: Uuid,
    intent: SettlementIntent,
) -> Result<(), LedgerError> {
    let intent: sea_orm_active_enums::SettlementIntent = intent.into();
    let changed = unpaid_entry_update(workspace_id, entry_id)
        .col_expr(ledger_entries::Column::SettlementIntent, Expr::value(intent.to_value()))
        .col_expr(
            ledger_entries::Column::UpdatedAt,
            Expr::value(DateTimeWithTimeZone::from(Utc::now())),
        )
        .exec(conn)
        .await
        .map_err(storage_error(workspace_id, Some(entry_id), "update_intent"))?
        .rows_affected;
    if changed == 0 {
        warn!(%workspace_id, %entry_id, "settlement intent change lost to a settlement");
        return Err(LedgerError::TransactionAlreadyPaid);
    }
    Ok(())
}

/// Ledger repository for entries and the CC lifecycle.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a manual entry.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive or the description is blank
    /// - A settlement intent is given for a non-CC entry
    /// - Database operation fails
    pub async fn create(
        &self,
        workspace_id: Uuid,
        mut input: CreateEntryInput,
    ) -> Result<ledger_entries::Model, LedgerError> {
        validate_amount(input.amount_minor)?;
        input.description = normalize_description(&input.description)?;
        let cc = LedgerService::resolve_cc_fields(input.is_cc_payment, input.settlement_intent)?;

        let model = entry_active_model(
            workspace_id,
            input,
            cc,
            EntryOrigin::manual(),
            Utc::now().into(),
        )
        .insert(&self.db)
        .await
        .map_err(storage_error(workspace_id, None, "create_entry"))?;

        info!(%workspace_id, entry_id = %model.id, "ledger entry created");
        Ok(model)
    }

    /// Gets a live entry by id.
    ///
    /// Entries of other workspaces are reported as not found.
    pub async fn get_by_id(
        &self,
        workspace_id: Uuid,
        entry_id: Uuid,
    ) -> Result<ledger_entries::Model, LedgerError> {
        find_live_entry(&self.db, workspace_id, entry_id).await
    }

    /// Edits an entry.
    ///
    /// Editing a projected entry materializes it: `is_projected` becomes
    /// false and the entry keeps its template link.
    pub async fn update(
        &self,
        workspace_id: Uuid,
        entry_id: Uuid,
        input: UpdateEntryInput,
    ) -> Result<ledger_entries::Model, LedgerError> {
        if let Some(amount) = input.amount_minor {
            validate_amount(amount)?;
        }
        let description = input
            .description
            .as_deref()
            .map(normalize_description)
            .transpose()?;

        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(entry_id), "begin_update"))?;

        let entry = find_live_entry(uow.conn(), workspace_id, entry_id).await?;
        let was_projected = entry.is_projected;

        let mut active: ledger_entries::ActiveModel = entry.into();
        if let Some(amount) = input.amount_minor {
            active.amount_minor = Set(amount);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        if let Some(date) = input.entry_date {
            active.entry_date = Set(date);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(account_id) = input.account_id {
            active.account_id = Set(Some(account_id));
        }
        active.is_projected = Set(false);
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(entry_id), "update_entry"))?;
        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(entry_id), "commit_update"))?;

        if was_projected {
            info!(%workspace_id, %entry_id, "projected entry materialized");
        }
        Ok(updated)
    }

    /// Soft-deletes an entry.
    pub async fn soft_delete(&self, workspace_id: Uuid, entry_id: Uuid) -> Result<(), LedgerError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::DeletedAt, Expr::value(now))
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_entries::Column::Id.eq(entry_id))
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(storage_error(workspace_id, Some(entry_id), "soft_delete_entry"))?;

        if result.rows_affected == 0 {
            return Err(LedgerError::TransactionNotFound(entry_id));
        }
        info!(%workspace_id, %entry_id, "ledger entry deleted");
        Ok(())
    }

    /// Lists live entries matching `filter`, newest first.
    pub async fn list_filtered(
        &self,
        workspace_id: Uuid,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<ledger_entries::Model>, LedgerError> {
        validate_date_range(filter.date_from, filter.date_to)?;
        let page = page.normalized();

        let mut query = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::DeletedAt.is_null());

        if let Some(entry_type) = filter.entry_type {
            query = query.filter(
                ledger_entries::Column::EntryType
                    .eq(sea_orm_active_enums::EntryType::from(entry_type)),
            );
        }
        if let Some(source) = filter.source {
            query = query.filter(
                ledger_entries::Column::Source
                    .eq(sea_orm_active_enums::EntrySource::from(source)),
            );
        }
        if let Some(is_paid) = filter.is_paid {
            query = query.filter(ledger_entries::Column::IsPaid.eq(is_paid));
        }
        if let Some(state) = filter.cc_state {
            query = query.filter(ledger_entries::Column::IsCcPayment.eq(true));
            query = match state {
                CcState::Pending => query
                    .filter(ledger_entries::Column::IsPaid.eq(false))
                    .filter(ledger_entries::Column::BilledAt.is_null()),
                CcState::Billed => query
                    .filter(ledger_entries::Column::IsPaid.eq(false))
                    .filter(ledger_entries::Column::BilledAt.is_not_null()),
                CcState::Settled => query.filter(ledger_entries::Column::IsPaid.eq(true)),
            };
        }
        if let Some(from) = filter.date_from {
            query = query.filter(ledger_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(ledger_entries::Column::EntryDate.lte(to));
        }
        if let Some(group_id) = filter.group_id {
            query = query.filter(ledger_entries::Column::GroupId.eq(group_id));
        }
        if let Some(template_id) = filter.template_id {
            query = query.filter(ledger_entries::Column::TemplateId.eq(template_id));
        }
        if !filter.include_projected {
            query = query.filter(ledger_entries::Column::IsProjected.eq(false));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "count_entries"))?;

        let data = query
            .order_by_desc(ledger_entries::Column::EntryDate)
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .order_by_asc(ledger_entries::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "list_entries"))?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Flips a CC entry between pending and billed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The entry is not found
    /// - The entry is not a CC charge with an intent
    /// - The entry is settled
    /// - Database operation fails
    pub async fn toggle_billed(
        &self,
        workspace_id: Uuid,
        entry_id: Uuid,
    ) -> Result<ledger_entries::Model, LedgerError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(entry_id), "begin_toggle_billed"))?;

        let entry = find_live_entry(uow.conn(), workspace_id, entry_id).await?;
        let transition = LedgerService::toggle_billed(entry_id, &entry.cc_snapshot(), Utc::now())
            .inspect_err(|err| {
                warn!(%workspace_id, %entry_id, error = %err, "toggle billed rejected");
            })?;

        write_billed_at(
            uow.conn(),
            workspace_id,
            entry_id,
            transition.billed_at.map(Into::into),
            transition.to,
        )
        .await?;
        let updated = find_live_entry(uow.conn(), workspace_id, entry_id).await?;
        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(entry_id), "commit_toggle_billed"))?;

        info!(
            %workspace_id,
            %entry_id,
            from = %transition.from,
            to = %transition.to,
            "cc state changed"
        );
        Ok(updated)
    }

    /// Changes the settlement intent of an unsettled CC entry.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The entry is not found
    /// - The entry is not a CC charge
    /// - The entry is already paid
    /// - `intent` is neither `immediate` nor `deferred`
    pub async fn update_settlement_intent(
        &self,
        workspace_id: Uuid,
        entry_id: Uuid,
        intent: &str,
    ) -> Result<ledger_entries::Model, LedgerError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(entry_id), "begin_update_intent"))?;

        let entry = find_live_entry(uow.conn(), workspace_id, entry_id).await?;
        let intent = LedgerService::update_settlement_intent(&entry.cc_snapshot(), intent)
            .inspect_err(|err| {
                warn!(%workspace_id, %entry_id, error = %err, "settlement intent change rejected");
            })?;

        write_settlement_intent(uow.conn(), workspace_id, entry_id, intent).await?;
        let updated = find_live_entry(uow.conn(), workspace_id, entry_id).await?;
        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(entry_id), "commit_update_intent"))?;

        Ok(updated)
    }

    /// Moves every listed pending CC entry to billed.
    ///
    /// Returns the number of rows updated; ids that are already billed,
    /// settled, non-CC or foreign are not counted.
    pub async fn batch_mark_billed(
        &self,
        workspace_id: Uuid,
        entry_ids: &[Uuid],
    ) -> Result<u64, LedgerError> {
        let ids = normalize_batch_ids(entry_ids)?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let result = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::BilledAt, Expr::value(now))
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_entries::Column::Id.is_in(ids.clone()))
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::IsCcPayment.eq(true))
            .filter(ledger_entries::Column::SettlementIntent.is_not_null())
            .filter(ledger_entries::Column::IsPaid.eq(false))
            .filter(ledger_entries::Column::BilledAt.is_null())
            .filter(ledger_entries::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "batch_mark_billed"))?;

        info!(
            %workspace_id,
            requested = ids.len(),
            billed = result.rows_affected,
            "cc entries marked billed"
        );
        Ok(result.rows_affected)
    }

    /// Creates a transfer and settles CC entries as one unit.
    ///
    /// The transfer is always stored as a paid manual transfer. Every id must
    /// match a live, unpaid CC entry of the workspace; otherwise nothing is
    /// written and `TransactionsNotFound` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `settle_ids` is empty or larger than the batch cap
    /// - The transfer amount or description is invalid
    /// - Any id does not match a settleable entry
    /// - Database operation fails
    pub async fn atomic_settle(
        &self,
        workspace_id: Uuid,
        mut transfer: CreateEntryInput,
        settle_ids: &[Uuid],
    ) -> Result<SettlementResult, LedgerError> {
        let ids = LedgerService::settlement_ids(settle_ids)?;
        validate_amount(transfer.amount_minor)?;
        transfer.description = normalize_description(&transfer.description)?;
        transfer.entry_type = EntryType::Transfer;
        transfer.is_paid = true;
        transfer.is_cc_payment = false;
        transfer.settlement_intent = None;
        let cc = LedgerService::resolve_cc_fields(false, None)?;

        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, None, "begin_settle"))?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let transfer = entry_active_model(workspace_id, transfer, cc, EntryOrigin::manual(), now)
            .insert(uow.conn())
            .await
            .map_err(storage_error(workspace_id, None, "insert_settlement_transfer"))?;

        let result = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::IsPaid, Expr::value(true))
            .col_expr(ledger_entries::Column::SettledAt, Expr::value(now))
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_entries::Column::Id.is_in(ids.clone()))
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(ledger_entries::Column::IsCcPayment.eq(true))
            .filter(ledger_entries::Column::IsPaid.eq(false))
            .filter(ledger_entries::Column::DeletedAt.is_null())
            .exec(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(transfer.id), "settle_entries"))?;

        if let Err(err) = LedgerService::verify_settled_count(ids.len(), result.rows_affected) {
            warn!(
                %workspace_id,
                expected = ids.len(),
                matched = result.rows_affected,
                "settlement rolled back"
            );
            uow.rollback()
                .await
                .map_err(storage_error(workspace_id, None, "rollback_settle"))?;
            return Err(err);
        }

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(transfer.id), "commit_settle"))?;

        info!(
            %workspace_id,
            transfer_id = %transfer.id,
            settled = result.rows_affected,
            "cc entries settled"
        );
        Ok(SettlementResult {
            transfer,
            settled_count: result.rows_affected,
        })
    }

    /// Sums live, non-projected entries of a type within an optional range.
    pub async fn sum_by_type(
        &self,
        workspace_id: Uuid,
        entry_type: EntryType,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<i64, LedgerError> {
        validate_date_range(from, to)?;

        let mut query = ledger_entries::Entity::find()
            .select_only()
            .column(ledger_entries::Column::AmountMinor)
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .filter(
                ledger_entries::Column::EntryType
                    .eq(sea_orm_active_enums::EntryType::from(entry_type)),
            )
            .filter(ledger_entries::Column::DeletedAt.is_null())
            .filter(ledger_entries::Column::IsProjected.eq(false));
        if let Some(from) = from {
            query = query.filter(ledger_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(ledger_entries::Column::EntryDate.lte(to));
        }

        let amounts: Vec<i64> = query
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage_error(workspace_id, None, "sum_by_type"))?;

        checked_total(amounts).ok_or(LedgerError::TotalOverflow)
    }

    /// Hard-deletes every row of the workspace in one unit.
    pub async fn clear_workspace(
        &self,
        workspace_id: Uuid,
    ) -> Result<ClearWorkspaceResult, LedgerError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, None, "begin_clear"))?;
        let conn = uow.conn();

        let entries = ledger_entries::Entity::delete_many()
            .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
            .exec(conn)
            .await
            .map_err(storage_error(workspace_id, None, "clear_entries"))?;
        let groups = transaction_groups::Entity::delete_many()
            .filter(transaction_groups::Column::WorkspaceId.eq(workspace_id))
            .exec(conn)
            .await
            .map_err(storage_error(workspace_id, None, "clear_groups"))?;
        let payments = loan_payments::Entity::delete_many()
            .filter(loan_payments::Column::WorkspaceId.eq(workspace_id))
            .exec(conn)
            .await
            .map_err(storage_error(workspace_id, None, "clear_payments"))?;
        let loans = loans::Entity::delete_many()
            .filter(loans::Column::WorkspaceId.eq(workspace_id))
            .exec(conn)
            .await
            .map_err(storage_error(workspace_id, None, "clear_loans"))?;
        let providers = loan_providers::Entity::delete_many()
            .filter(loan_providers::Column::WorkspaceId.eq(workspace_id))
            .exec(conn)
            .await
            .map_err(storage_error(workspace_id, None, "clear_providers"))?;
        let templates = recurring_templates::Entity::delete_many()
            .filter(recurring_templates::Column::WorkspaceId.eq(workspace_id))
            .exec(conn)
            .await
            .map_err(storage_error(workspace_id, None, "clear_templates"))?;

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, None, "commit_clear"))?;

        let result = ClearWorkspaceResult {
            entries: entries.rows_affected,
            groups: groups.rows_affected,
            payments: payments.rows_affected,
            loans: loans.rows_affected,
            providers: providers.rows_affected,
            templates: templates.rows_affected,
        };
        info!(%workspace_id, ?result, "workspace cleared");
        Ok(result)
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
