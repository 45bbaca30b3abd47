//! Demo data seeder for Ledgerly development.
//!
//! Resets a fixed demo workspace and fills it with a consolidated loan
//! provider, credit-card charges, a recurring template and the groups and
//! projections the engines derive from them.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use ledgerly_core::ledger::{EntryType, SettlementIntent};
use ledgerly_core::loan::PaymentMode;
use ledgerly_db::migration::Migrator;
use ledgerly_db::repositories::{
    CreateEntryInput, CreateLoanInput, CreateProviderInput, CreateTemplateInput, GroupRepository,
    LedgerRepository, LoanRepository, RecurringRepository,
};
use ledgerly_shared::AppConfig;
use ledgerly_shared::telemetry::init_tracing;
use ledgerly_shared::types::YearMonth;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use uuid::Uuid;

/// Demo workspace id (stable across runs).
const DEMO_WORKSPACE_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let db = ledgerly_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;
    info!("Connected to database");

    let ws = DEMO_WORKSPACE_ID;
    let ledger = LedgerRepository::new(db.clone());
    let loans = LoanRepository::new(db.clone());
    let groups = GroupRepository::new(db.clone());
    let recurring = RecurringRepository::new(db);

    let cleared = ledger.clear_workspace(ws).await?;
    info!(entries = cleared.entries, "demo workspace reset");

    let today = Utc::now().date_naive();
    let this_month = YearMonth::from_date(today);

    // Consolidated provider with two installment plans.
    let provider = loans
        .create_provider(
            ws,
            CreateProviderInput {
                name: "Akulaku".to_string(),
                payment_mode: PaymentMode::ConsolidatedMonthly,
                cutoff_day: 5,
            },
        )
        .await?;
    for (name, monthly, term) in [("Phone", 450_000, 6), ("Headphones", 120_000, 3)] {
        loans
            .create_loan(
                ws,
                CreateLoanInput {
                    provider_id: provider.id,
                    name: name.to_string(),
                    principal_minor: monthly * i64::from(term),
                    monthly_amount_minor: monthly,
                    first_due: this_month.prev(),
                    term_months: term,
                    account_id: None,
                    category_id: None,
                },
            )
            .await?;
    }
    let paid = loans.pay_month(ws, provider.id, this_month.prev()).await?;
    info!(month = %paid.month, paid = paid.paid_count, "seeded loan payments");

    // Credit-card charges: one settled, one billed, one pending.
    let mut card_ids = Vec::new();
    for (description, amount, day) in [
        ("Groceries", 235_000, 2),
        ("Fuel", 150_000, 6),
        ("Dinner", 310_000, 9),
    ] {
        let entry = ledger
            .create(
                ws,
                CreateEntryInput::new(
                    EntryType::Expense,
                    amount,
                    description,
                    this_month.clamp_day(day),
                )
                .credit_card(Some(SettlementIntent::Deferred)),
            )
            .await?;
        card_ids.push(entry.id);
    }
    ledger.batch_mark_billed(ws, &card_ids[..2]).await?;
    ledger
        .atomic_settle(
            ws,
            CreateEntryInput::new(EntryType::Transfer, 235_000, "Card payment", today),
            &card_ids[..1],
        )
        .await?;

    // Monthly salary and rent, projected for this month and the next.
    for (name, entry_type, amount, due_day) in [
        ("Salary", "income", 12_000_000, 25),
        ("Rent", "expense", 3_500_000, 1),
    ] {
        recurring
            .create_template(
                ws,
                CreateTemplateInput {
                    name: name.to_string(),
                    entry_type: entry_type.to_string(),
                    amount_minor: amount,
                    due_day,
                    category_id: None,
                    account_id: None,
                    starts_on: None,
                    ends_on: None,
                },
            )
            .await?;
    }
    for month in [this_month, this_month.next()] {
        let generated = recurring.generate_for_month(ws, month).await?;
        info!(%month, created = generated.created_count(), "seeded projections");
    }

    let detected = groups.detect_and_group(ws, this_month).await?;
    info!(groups = detected.created.len(), "seeded auto-detected groups");

    info!(workspace_id = %ws, "seeding complete");
    Ok(())
}
