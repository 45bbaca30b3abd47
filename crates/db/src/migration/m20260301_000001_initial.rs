//! Initial schema migration.
//!
//! - `loan_providers`, `loans`, `loan_payments`: the loan sub-ledger
//! - `recurring_templates`: sources of projected entries
//! - `transaction_groups`: manual and auto-detected groups
//! - `ledger_entries`: the shared ledger
//!
//! Two unique indexes back the read-then-write idempotency checks:
//! `(workspace_id, projection_key)` on entries and
//! `(workspace_id, auto_detect_key)` on groups.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ============================================================
// Table identifiers
// ============================================================

#[derive(Iden)]
enum LoanProviders {
    Table,
    Id,
    WorkspaceId,
    Name,
    PaymentMode,
    CutoffDay,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Loans {
    Table,
    Id,
    WorkspaceId,
    ProviderId,
    Name,
    PrincipalMinor,
    MonthlyAmountMinor,
    FirstDueYear,
    FirstDueMonth,
    TermMonths,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum LoanPayments {
    Table,
    Id,
    WorkspaceId,
    LoanId,
    DueYear,
    DueMonth,
    AmountMinor,
    IsPaid,
    PaidDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum RecurringTemplates {
    Table,
    Id,
    WorkspaceId,
    Name,
    EntryType,
    AmountMinor,
    DueDay,
    CategoryId,
    AccountId,
    IsActive,
    StartsOn,
    EndsOn,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TransactionGroups {
    Table,
    Id,
    WorkspaceId,
    Name,
    Month,
    AutoDetected,
    LoanProviderId,
    AutoDetectKey,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    WorkspaceId,
    EntryType,
    AmountMinor,
    Description,
    EntryDate,
    IsPaid,
    CategoryId,
    AccountId,
    TransferAccountId,
    TransferPairId,
    Source,
    TemplateId,
    IsProjected,
    ProjectionKey,
    LoanPaymentId,
    GroupId,
    IsCcPayment,
    SettlementIntent,
    BilledAt,
    SettledAt,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

// ============================================================
// Migration implementation
// ============================================================

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: LOAN SUB-LEDGER
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(LoanProviders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LoanProviders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LoanProviders::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(LoanProviders::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(LoanProviders::PaymentMode)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LoanProviders::CutoffDay).integer().not_null())
                    .col(ColumnDef::new(LoanProviders::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(LoanProviders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanProviders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Loans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Loans::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Loans::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(Loans::ProviderId).uuid().not_null())
                    .col(ColumnDef::new(Loans::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Loans::PrincipalMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Loans::MonthlyAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Loans::FirstDueYear).integer().not_null())
                    .col(ColumnDef::new(Loans::FirstDueMonth).integer().not_null())
                    .col(ColumnDef::new(Loans::TermMonths).integer().not_null())
                    .col(ColumnDef::new(Loans::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Loans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Loans::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loans-provider_id")
                            .from(Loans::Table, Loans::ProviderId)
                            .to(LoanProviders::Table, LoanProviders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LoanPayments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LoanPayments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LoanPayments::WorkspaceId).uuid().not_null())
                    .col(ColumnDef::new(LoanPayments::LoanId).uuid().not_null())
                    .col(ColumnDef::new(LoanPayments::DueYear).integer().not_null())
                    .col(ColumnDef::new(LoanPayments::DueMonth).integer().not_null())
                    .col(
                        ColumnDef::new(LoanPayments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanPayments::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(LoanPayments::PaidDate).date())
                    .col(
                        ColumnDef::new(LoanPayments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanPayments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loan_payments-loan_id")
                            .from(LoanPayments::Table, LoanPayments::LoanId)
                            .to(Loans::Table, Loans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loan_payments-loan_id-due")
                    .table(LoanPayments::Table)
                    .col(LoanPayments::LoanId)
                    .col(LoanPayments::DueYear)
                    .col(LoanPayments::DueMonth)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: RECURRING TEMPLATES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(RecurringTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecurringTemplates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RecurringTemplates::WorkspaceId).uuid().not_null())
                    .col(
                        ColumnDef::new(RecurringTemplates::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringTemplates::EntryType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringTemplates::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringTemplates::DueDay).integer().not_null())
                    .col(ColumnDef::new(RecurringTemplates::CategoryId).uuid())
                    .col(ColumnDef::new(RecurringTemplates::AccountId).uuid())
                    .col(
                        ColumnDef::new(RecurringTemplates::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(RecurringTemplates::StartsOn).date())
                    .col(ColumnDef::new(RecurringTemplates::EndsOn).date())
                    .col(ColumnDef::new(RecurringTemplates::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(RecurringTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurringTemplates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: TRANSACTION GROUPS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(TransactionGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionGroups::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TransactionGroups::WorkspaceId).uuid().not_null())
                    .col(
                        ColumnDef::new(TransactionGroups::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionGroups::Month).string_len(7).not_null())
                    .col(
                        ColumnDef::new(TransactionGroups::AutoDetected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(TransactionGroups::LoanProviderId).uuid())
                    .col(ColumnDef::new(TransactionGroups::AutoDetectKey).string_len(64))
                    .col(
                        ColumnDef::new(TransactionGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionGroups::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_groups-loan_provider_id")
                            .from(TransactionGroups::Table, TransactionGroups::LoanProviderId)
                            .to(LoanProviders::Table, LoanProviders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-transaction_groups-workspace_id-auto_detect_key")
                    .table(TransactionGroups::Table)
                    .col(TransactionGroups::WorkspaceId)
                    .col(TransactionGroups::AutoDetectKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 4: LEDGER ENTRIES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LedgerEntries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LedgerEntries::WorkspaceId).uuid().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::EntryType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Description).text().not_null())
                    .col(ColumnDef::new(LedgerEntries::EntryDate).date().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(LedgerEntries::CategoryId).uuid())
                    .col(ColumnDef::new(LedgerEntries::AccountId).uuid())
                    .col(ColumnDef::new(LedgerEntries::TransferAccountId).uuid())
                    .col(ColumnDef::new(LedgerEntries::TransferPairId).uuid())
                    .col(ColumnDef::new(LedgerEntries::Source).string_len(16).not_null())
                    .col(ColumnDef::new(LedgerEntries::TemplateId).uuid())
                    .col(
                        ColumnDef::new(LedgerEntries::IsProjected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(LedgerEntries::ProjectionKey).string_len(64))
                    .col(ColumnDef::new(LedgerEntries::LoanPaymentId).uuid())
                    .col(ColumnDef::new(LedgerEntries::GroupId).uuid())
                    .col(
                        ColumnDef::new(LedgerEntries::IsCcPayment)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(LedgerEntries::SettlementIntent).string_len(16))
                    .col(ColumnDef::new(LedgerEntries::BilledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(LedgerEntries::SettledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(LedgerEntries::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-group_id")
                            .from(LedgerEntries::Table, LedgerEntries::GroupId)
                            .to(TransactionGroups::Table, TransactionGroups::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-template_id")
                            .from(LedgerEntries::Table, LedgerEntries::TemplateId)
                            .to(RecurringTemplates::Table, RecurringTemplates::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-loan_payment_id")
                            .from(LedgerEntries::Table, LedgerEntries::LoanPaymentId)
                            .to(LoanPayments::Table, LoanPayments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-ledger_entries-workspace_id-projection_key")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::WorkspaceId)
                    .col(LedgerEntries::ProjectionKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-workspace_id-entry_date")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::WorkspaceId)
                    .col(LedgerEntries::EntryDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-group_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-template_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::TemplateId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecurringTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoanPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Loans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoanProviders::Table).to_owned())
            .await?;
        Ok(())
    }
}
