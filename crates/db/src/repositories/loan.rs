//! Loan repository: providers, loans and the consolidated payment engine.
//!
//! Every pay/unpay loads the provider's full schedule inside the unit of
//! work, asks [`PaymentSchedule`] whether the request is in sequence, and
//! flips the payments together with their loan-sourced ledger entries.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use ledgerly_core::ledger::{CcFields, EntryType, checked_total};
use ledgerly_core::loan::{
    LoanPaymentError, LoanService, PayMonthResult, PayRangeResult, PaymentMode, PaymentSchedule,
    ProviderPaymentStatus, UnpayMonthResult,
};
use ledgerly_shared::types::YearMonth;

use super::ledger::{CreateEntryInput, EntryOrigin, entry_active_model};
use crate::entities::{ledger_entries, loan_payments, loan_providers, loans};
use crate::unit_of_work::UnitOfWorkExt;

/// Input for creating a loan provider.
#[derive(Debug, Clone)]
pub struct CreateProviderInput {
    /// Display name.
    pub name: String,
    /// How payments are settled.
    pub payment_mode: PaymentMode,
    /// Billing cutoff day, 1..=31.
    pub cutoff_day: u32,
}

/// Input for creating a loan.
#[derive(Debug, Clone)]
pub struct CreateLoanInput {
    /// Provider the loan belongs to.
    pub provider_id: Uuid,
    /// Display name.
    pub name: String,
    /// Borrowed amount, minor units.
    pub principal_minor: i64,
    /// Amount due each month, minor units.
    pub monthly_amount_minor: i64,
    /// Month of the first payment.
    pub first_due: YearMonth,
    /// Number of monthly payments.
    pub term_months: u32,
    /// Account the installments are paid from.
    pub account_id: Option<Uuid>,
    /// Category of the installment entries.
    pub category_id: Option<Uuid>,
}

/// A loan with its schedule and ledger entries.
#[derive(Debug, Clone, Serialize)]
pub struct LoanWithPayments {
    /// The loan.
    pub loan: loans::Model,
    /// Its payments, in due order.
    pub payments: Vec<loan_payments::Model>,
    /// One loan-sourced expense per payment.
    pub entries: Vec<ledger_entries::Model>,
}

/// Maps a storage failure to [`LoanPaymentError::Database`], logging its context.
fn storage_error(
    workspace_id: Uuid,
    provider_id: Option<Uuid>,
    operation: &'static str,
) -> impl FnOnce(DbErr) -> LoanPaymentError {
    move |err| {
        error!(%workspace_id, ?provider_id, operation, error = %err, "loan storage failure");
        LoanPaymentError::Database(err.to_string())
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Loads a live provider of the workspace.
async fn find_provider<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    provider_id: Uuid,
) -> Result<loan_providers::Model, LoanPaymentError> {
    loan_providers::Entity::find_by_id(provider_id)
        .filter(loan_providers::Column::WorkspaceId.eq(workspace_id))
        .filter(loan_providers::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .map_err(storage_error(workspace_id, Some(provider_id), "find_provider"))?
        .ok_or(LoanPaymentError::ProviderNotFound(provider_id))
}

/// Loads every payment of the provider's live loans.
async fn provider_payments<C: ConnectionTrait>(
    conn: &C,
    workspace_id: Uuid,
    provider_id: Uuid,
) -> Result<Vec<loan_payments::Model>, LoanPaymentError> {
    let loan_ids: Vec<Uuid> = loans::Entity::find()
        .filter(loans::Column::WorkspaceId.eq(workspace_id))
        .filter(loans::Column::ProviderId.eq(provider_id))
        .filter(loans::Column::DeletedAt.is_null())
        .all(conn)
        .await
        .map_err(storage_error(workspace_id, Some(provider_id), "find_loans"))?
        .into_iter()
        .map(|loan| loan.id)
        .collect();

    if loan_ids.is_empty() {
        return Ok(Vec::new());
    }

    loan_payments::Entity::find()
        .filter(loan_payments::Column::WorkspaceId.eq(workspace_id))
        .filter(loan_payments::Column::LoanId.is_in(loan_ids))
        .order_by_asc(loan_payments::Column::DueYear)
        .order_by_asc(loan_payments::Column::DueMonth)
        .order_by_asc(loan_payments::Column::Id)
        .all(conn)
        .await
        .map_err(storage_error(workspace_id, Some(provider_id), "find_payments"))
}

fn schedule_of(payments: &[loan_payments::Model]) -> Result<PaymentSchedule, LoanPaymentError> {
    PaymentSchedule::from_rows(payments.iter().filter_map(loan_payments::Model::payment_row))
}

/// Ids of the payments due in `month` whose paid flag equals `is_paid`.
fn payment_ids_in(payments: &[loan_payments::Model], month: YearMonth, is_paid: bool) -> Vec<Uuid> {
    payments
        .iter()
        .filter(|p| p.due() == Some(month) && p.is_paid == is_paid)
        .map(|p| p.id)
        .collect()
}

/// A request to flip payments of one month to `paid`.
struct MonthFlip<'a> {
    workspace_id: Uuid,
    provider_id: Uuid,
    month: YearMonth,
    ids: &'a [Uuid],
    paid: bool,
    now: DateTimeWithTimeZone,
}

/// Flips the listed payments of a month, with their ledger entries.
///
/// Every id must be a payment of `payments` due in the month that is
/// currently in the opposite state; otherwise `PaymentIdsInvalid` is
/// returned and nothing is written. Returns the number flipped and their total.
async fn set_month_paid<C: ConnectionTrait>(
    conn: &C,
    payments: &[loan_payments::Model],
    flip: MonthFlip<'_>,
) -> Result<(usize, i64), LoanPaymentError> {
    let MonthFlip {
        workspace_id,
        provider_id,
        month,
        ids,
        paid,
        now,
    } = flip;
    let requested: HashSet<Uuid> = ids.iter().copied().collect();
    let matched: Vec<&loan_payments::Model> = payments
        .iter()
        .filter(|p| requested.contains(&p.id) && p.due() == Some(month) && p.is_paid != paid)
        .collect();
    LoanService::verify_payment_ids(requested.len(), matched.len())?;

    let total = checked_total(matched.iter().map(|p| p.amount_minor))
        .ok_or(LoanPaymentError::TotalOverflow)?;
    let paid_date = paid.then(|| now.date_naive());

    let result = loan_payments::Entity::update_many()
        .col_expr(loan_payments::Column::IsPaid, Expr::value(paid))
        .col_expr(loan_payments::Column::PaidDate, Expr::value(paid_date))
        .col_expr(loan_payments::Column::UpdatedAt, Expr::value(now))
        .filter(loan_payments::Column::Id.is_in(requested.iter().copied()))
        .filter(loan_payments::Column::WorkspaceId.eq(workspace_id))
        .filter(loan_payments::Column::IsPaid.eq(!paid))
        .exec(conn)
        .await
        .map_err(storage_error(workspace_id, Some(provider_id), "update_payments"))?;

    let updated = usize::try_from(result.rows_affected).unwrap_or(usize::MAX);
    LoanService::verify_payment_ids(requested.len(), updated)?;

    ledger_entries::Entity::update_many()
        .col_expr(ledger_entries::Column::IsPaid, Expr::value(paid))
        .col_expr(ledger_entries::Column::SettledAt, Expr::value(paid.then_some(now)))
        .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
        .filter(ledger_entries::Column::WorkspaceId.eq(workspace_id))
        .filter(ledger_entries::Column::LoanPaymentId.is_in(requested.iter().copied()))
        .filter(ledger_entries::Column::DeletedAt.is_null())
        .exec(conn)
        .await
        .map_err(storage_error(workspace_id, Some(provider_id), "update_loan_entries"))?;

    Ok((matched.len(), total))
}

/// Loan repository for providers, loans and payment sequencing.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    db: DatabaseConnection,
}

impl LoanRepository {
    /// Creates a new loan repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a loan provider.
    pub async fn create_provider(
        &self,
        workspace_id: Uuid,
        input: CreateProviderInput,
    ) -> Result<loan_providers::Model, LoanPaymentError> {
        let name = LoanService::validate_provider(&input.name, input.cutoff_day)?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let provider = loan_providers::ActiveModel {
            id: Set(Uuid::now_v7()),
            workspace_id: Set(workspace_id),
            name: Set(name),
            payment_mode: Set(input.payment_mode.into()),
            cutoff_day: Set(to_i32(input.cutoff_day)),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(storage_error(workspace_id, None, "create_provider"))?;

        info!(%workspace_id, provider_id = %provider.id, mode = %input.payment_mode, "loan provider created");
        Ok(provider)
    }

    /// Gets a live provider by id.
    pub async fn get_provider(
        &self,
        workspace_id: Uuid,
        provider_id: Uuid,
    ) -> Result<loan_providers::Model, LoanPaymentError> {
        find_provider(&self.db, workspace_id, provider_id).await
    }

    /// Creates a loan, its payment schedule and one ledger expense per payment.
    ///
    /// Entries are dated on the provider's cutoff day, clamped to each month.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The provider is not found
    /// - The name is blank, an amount or the term is out of range
    /// - Database operation fails
    pub async fn create_loan(
        &self,
        workspace_id: Uuid,
        input: CreateLoanInput,
    ) -> Result<LoanWithPayments, LoanPaymentError> {
        let name = LoanService::validate_name(&input.name)?;
        LoanService::validate_amount(input.principal_minor)?;
        let schedule = LoanService::build_schedule(
            input.first_due,
            input.term_months,
            input.monthly_amount_minor,
        )?;

        let provider_id = input.provider_id;
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "begin_create_loan"))?;
        let provider = find_provider(uow.conn(), workspace_id, provider_id).await?;
        let cutoff_day = u32::try_from(provider.cutoff_day).unwrap_or(1);
        let now: DateTimeWithTimeZone = Utc::now().into();

        let loan = loans::ActiveModel {
            id: Set(Uuid::now_v7()),
            workspace_id: Set(workspace_id),
            provider_id: Set(provider_id),
            name: Set(name.clone()),
            principal_minor: Set(input.principal_minor),
            monthly_amount_minor: Set(input.monthly_amount_minor),
            first_due_year: Set(input.first_due.year()),
            first_due_month: Set(to_i32(input.first_due.month())),
            term_months: Set(to_i32(input.term_months)),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(uow.conn())
        .await
        .map_err(storage_error(workspace_id, Some(provider_id), "insert_loan"))?;

        let mut payments = Vec::with_capacity(schedule.len());
        let mut entries = Vec::with_capacity(schedule.len());
        for scheduled in schedule {
            let payment = loan_payments::ActiveModel {
                id: Set(Uuid::now_v7()),
                workspace_id: Set(workspace_id),
                loan_id: Set(loan.id),
                due_year: Set(scheduled.month.year()),
                due_month: Set(to_i32(scheduled.month.month())),
                amount_minor: Set(scheduled.amount_minor),
                is_paid: Set(false),
                paid_date: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "insert_payment"))?;

            let mut entry_input = CreateEntryInput::new(
                EntryType::Expense,
                scheduled.amount_minor,
                format!("{name} {}", scheduled.month),
                LoanService::due_date(scheduled.month, cutoff_day),
            );
            entry_input.account_id = input.account_id;
            entry_input.category_id = input.category_id;

            let entry = entry_active_model(
                workspace_id,
                entry_input,
                CcFields {
                    is_cc_payment: false,
                    settlement_intent: None,
                },
                EntryOrigin::loan(payment.id),
                now,
            )
            .insert(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "insert_loan_entry"))?;

            payments.push(payment);
            entries.push(entry);
        }

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "commit_create_loan"))?;

        info!(
            %workspace_id,
            %provider_id,
            loan_id = %loan.id,
            payments = payments.len(),
            "loan created"
        );
        Ok(LoanWithPayments {
            loan,
            payments,
            entries,
        })
    }

    /// Month-by-month payment status of a provider.
    pub async fn payment_status(
        &self,
        workspace_id: Uuid,
        provider_id: Uuid,
    ) -> Result<ProviderPaymentStatus, LoanPaymentError> {
        let provider = find_provider(&self.db, workspace_id, provider_id).await?;
        let payments = provider_payments(&self.db, workspace_id, provider_id).await?;
        Ok(LoanService::payment_status(
            provider_id,
            provider.payment_mode.into(),
            &schedule_of(&payments)?,
        ))
    }

    /// Pays every unpaid payment of the provider's earliest unpaid month.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The provider is not found or not consolidated
    /// - Nothing is left to pay
    /// - `month` is not the earliest unpaid month
    /// - Database operation fails
    pub async fn pay_month(
        &self,
        workspace_id: Uuid,
        provider_id: Uuid,
        month: YearMonth,
    ) -> Result<PayMonthResult, LoanPaymentError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "begin_pay_month"))?;

        let provider = find_provider(uow.conn(), workspace_id, provider_id).await?;
        LoanService::require_consolidated(provider_id, provider.payment_mode.into())?;
        let payments = provider_payments(uow.conn(), workspace_id, provider_id).await?;
        let schedule = schedule_of(&payments)?;

        schedule.validate_pay_month(month).inspect_err(|err| {
            warn!(%workspace_id, %provider_id, %month, error = %err, "pay month rejected");
        })?;

        let ids = payment_ids_in(&payments, month, false);
        let now: DateTimeWithTimeZone = Utc::now().into();
        let (paid_count, total_amount_minor) = set_month_paid(
            uow.conn(),
            &payments,
            MonthFlip {
                workspace_id,
                provider_id,
                month,
                ids: &ids,
                paid: true,
                now,
            },
        )
        .await?;

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "commit_pay_month"))?;

        let next_payable_month = schedule.with_months_paid(&[month]).earliest_unpaid();
        info!(%workspace_id, %provider_id, %month, paid_count, total_amount_minor, "loan month paid");
        Ok(PayMonthResult {
            month,
            paid_count,
            total_amount_minor,
            paid_at: now.with_timezone(&Utc),
            next_payable_month,
        })
    }

    /// Pays an explicit set of payments of the provider's earliest unpaid month.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The provider is not found or not consolidated
    /// - `month` is not the earliest unpaid month
    /// - Any id is not an unpaid payment of the provider due in `month`
    /// - Database operation fails
    pub async fn pay_payments(
        &self,
        workspace_id: Uuid,
        provider_id: Uuid,
        month: YearMonth,
        payment_ids: &[Uuid],
    ) -> Result<PayMonthResult, LoanPaymentError> {
        let ids = LoanService::normalize_payment_ids(payment_ids)?;
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "begin_pay_payments"))?;

        let provider = find_provider(uow.conn(), workspace_id, provider_id).await?;
        LoanService::require_consolidated(provider_id, provider.payment_mode.into())?;
        let payments = provider_payments(uow.conn(), workspace_id, provider_id).await?;
        schedule_of(&payments)?.validate_pay_month(month)?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let (paid_count, total_amount_minor) = set_month_paid(
            uow.conn(),
            &payments,
            MonthFlip {
                workspace_id,
                provider_id,
                month,
                ids: &ids,
                paid: true,
                now,
            },
        )
        .await
        .inspect_err(|err| {
            warn!(%workspace_id, %provider_id, %month, error = %err, "pay payments rejected");
        })?;

        let paid: HashSet<Uuid> = ids.into_iter().collect();
        let after = PaymentSchedule::from_rows(payments.iter().filter_map(|p| {
            let mut row = p.payment_row()?;
            row.is_paid |= paid.contains(&p.id);
            Some(row)
        }))?;

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "commit_pay_payments"))?;

        info!(%workspace_id, %provider_id, %month, paid_count, "loan payments paid");
        Ok(PayMonthResult {
            month,
            paid_count,
            total_amount_minor,
            paid_at: now.with_timezone(&Utc),
            next_payable_month: after.earliest_unpaid(),
        })
    }

    /// Pays every month from `start` through `end` as one unit.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The provider is not found or not consolidated
    /// - `end` is not after `start`
    /// - `start` is not the earliest unpaid month
    /// - A month in the range has nothing to pay
    /// - Database operation fails
    pub async fn pay_range(
        &self,
        workspace_id: Uuid,
        provider_id: Uuid,
        start: YearMonth,
        end: YearMonth,
    ) -> Result<PayRangeResult, LoanPaymentError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "begin_pay_range"))?;

        let provider = find_provider(uow.conn(), workspace_id, provider_id).await?;
        LoanService::require_consolidated(provider_id, provider.payment_mode.into())?;
        let payments = provider_payments(uow.conn(), workspace_id, provider_id).await?;
        let schedule = schedule_of(&payments)?;

        let plan = schedule.plan_pay_range(start, end).inspect_err(|err| {
            warn!(%workspace_id, %provider_id, %start, %end, error = %err, "pay range rejected");
        })?;

        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut months_paid = Vec::with_capacity(plan.len());
        let mut paid_count = 0;
        let mut total_amount_minor: i64 = 0;
        for status in plan {
            let ids = payment_ids_in(&payments, status.month, false);
            let (count, total) = set_month_paid(
                uow.conn(),
                &payments,
                MonthFlip {
                    workspace_id,
                    provider_id,
                    month: status.month,
                    ids: &ids,
                    paid: true,
                    now,
                },
            )
            .await?;
            months_paid.push(status.month);
            paid_count += count;
            total_amount_minor = total_amount_minor
                .checked_add(total)
                .ok_or(LoanPaymentError::TotalOverflow)?;
        }

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "commit_pay_range"))?;

        let next_payable_month = schedule.with_months_paid(&months_paid).earliest_unpaid();
        info!(
            %workspace_id,
            %provider_id,
            months = months_paid.len(),
            paid_count,
            total_amount_minor,
            "loan months paid"
        );
        Ok(PayRangeResult {
            months_paid,
            paid_count,
            total_amount_minor,
            paid_at: now.with_timezone(&Utc),
            next_payable_month,
        })
    }

    /// Unpays every payment of the provider's latest paid month.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The provider is not found or not consolidated
    /// - Nothing is paid
    /// - `month` is not the latest paid month
    /// - Database operation fails
    pub async fn unpay_month(
        &self,
        workspace_id: Uuid,
        provider_id: Uuid,
        month: YearMonth,
    ) -> Result<UnpayMonthResult, LoanPaymentError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "begin_unpay_month"))?;

        let provider = find_provider(uow.conn(), workspace_id, provider_id).await?;
        LoanService::require_consolidated(provider_id, provider.payment_mode.into())?;
        let payments = provider_payments(uow.conn(), workspace_id, provider_id).await?;
        let schedule = schedule_of(&payments)?;

        schedule.validate_unpay_month(month).inspect_err(|err| {
            warn!(%workspace_id, %provider_id, %month, error = %err, "unpay month rejected");
        })?;

        let ids = payment_ids_in(&payments, month, true);
        let now: DateTimeWithTimeZone = Utc::now().into();
        let (unpaid_count, total_amount_minor) = set_month_paid(
            uow.conn(),
            &payments,
            MonthFlip {
                workspace_id,
                provider_id,
                month,
                ids: &ids,
                paid: false,
                now,
            },
        )
        .await?;

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(provider_id), "commit_unpay_month"))?;

        info!(%workspace_id, %provider_id, %month, unpaid_count, "loan month unpaid");
        Ok(UnpayMonthResult {
            month,
            unpaid_count,
            total_amount_minor,
            previous_payable: schedule.previous_paid_before(month),
        })
    }

    /// Flips one payment of a per-item provider, with its ledger entry.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payment, its loan or its provider is not found
    /// - The provider is consolidated
    /// - Database operation fails
    pub async fn toggle_payment(
        &self,
        workspace_id: Uuid,
        payment_id: Uuid,
    ) -> Result<loan_payments::Model, LoanPaymentError> {
        let uow = self
            .db
            .unit_of_work(workspace_id)
            .await
            .map_err(storage_error(workspace_id, None, "begin_toggle_payment"))?;

        let payment = loan_payments::Entity::find_by_id(payment_id)
            .filter(loan_payments::Column::WorkspaceId.eq(workspace_id))
            .one(uow.conn())
            .await
            .map_err(storage_error(workspace_id, None, "find_payment"))?
            .ok_or(LoanPaymentError::PaymentNotFound(payment_id))?;
        let loan = loans::Entity::find_by_id(payment.loan_id)
            .filter(loans::Column::WorkspaceId.eq(workspace_id))
            .filter(loans::Column::DeletedAt.is_null())
            .one(uow.conn())
            .await
            .map_err(storage_error(workspace_id, None, "find_payment_loan"))?
            .ok_or(LoanPaymentError::PaymentNotFound(payment_id))?;
        let provider = find_provider(uow.conn(), workspace_id, loan.provider_id).await?;
        LoanService::require_per_item(provider.id, provider.payment_mode.into())
            .inspect_err(|err| {
                warn!(%workspace_id, %payment_id, error = %err, "toggle payment rejected");
            })?;

        let month = payment
            .due()
            .ok_or(LoanPaymentError::PaymentNotFound(payment_id))?;
        let paid = !payment.is_paid;
        let now: DateTimeWithTimeZone = Utc::now().into();
        set_month_paid(
            uow.conn(),
            std::slice::from_ref(&payment),
            MonthFlip {
                workspace_id,
                provider_id: provider.id,
                month,
                ids: &[payment_id],
                paid,
                now,
            },
        )
        .await?;

        let updated = loan_payments::Entity::find_by_id(payment_id)
            .one(uow.conn())
            .await
            .map_err(storage_error(workspace_id, Some(provider.id), "reload_payment"))?
            .ok_or(LoanPaymentError::PaymentNotFound(payment_id))?;

        uow.commit()
            .await
            .map_err(storage_error(workspace_id, Some(provider.id), "commit_toggle_payment"))?;

        info!(%workspace_id, %payment_id, is_paid = paid, "loan payment toggled");
        Ok(updated)
    }
}
