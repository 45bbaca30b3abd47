//! Tests for guarded CC writes and amount sums over stored rows.

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use ledgerly_core::ledger::{
    CcFields, CcState, EntryType, LedgerError, LedgerService, MAX_AMOUNT_MINOR, SettlementIntent,
};

use super::{
    CreateEntryInput, EntryOrigin, LedgerRepository, entry_active_model, write_billed_at,
    write_settlement_intent,
};
use crate::entities::sea_orm_active_enums;
use crate::migration::Migrator;

async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, day).unwrap()
}

/// Stores an expense row as-is, without the create-time checks.
async fn stored_expense(db: &DatabaseConnection, workspace_id: Uuid, amount_minor: i64) {
    entry_active_model(
        workspace_id,
        CreateEntryInput::new(EntryType::Expense, amount_minor, "Imported", may(3)),
        CcFields {
            is_cc_payment: false,
            settlement_intent: None,
        },
        EntryOrigin::manual(),
        Utc::now().into(),
    )
    .insert(db)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_cc_writes_after_settlement_change_nothing() {
    let db = setup_db().await;
    let repo = LedgerRepository::new(db.clone());
    let ws = Uuid::new_v4();
    let entry = repo
        .create(
            ws,
            CreateEntryInput::new(EntryType::Expense, 800, "Groceries", may(2))
                .credit_card(Some(SettlementIntent::Deferred)),
        )
        .await
        .unwrap();

    // Both writes were decided on this snapshot, before the settlement landed.
    let snapshot = entry.cc_snapshot();
    let transition = LedgerService::toggle_billed(entry.id, &snapshot, Utc::now()).unwrap();
    assert_eq!(transition.to, CcState::Billed);
    let intent = LedgerService::update_settlement_intent(&snapshot, "immediate").unwrap();

    repo.atomic_settle(
        ws,
        CreateEntryInput::new(EntryType::Transfer, 800, "Card payment", may(25)),
        &[entry.id],
    )
    .await
    .unwrap();

    let billed = write_billed_at(
        &db,
        ws,
        entry.id,
        transition.billed_at.map(Into::into),
        transition.to,
    )
    .await;
    assert!(matches!(
        billed,
        Err(LedgerError::InvalidCcStateTransition {
            from: CcState::Settled,
            to: CcState::Billed,
        })
    ));

    let changed = write_settlement_intent(&db, ws, entry.id, intent).await;
    assert!(matches!(changed, Err(LedgerError::TransactionAlreadyPaid)));

    let stored = repo.get_by_id(ws, entry.id).await.unwrap();
    assert!(stored.is_paid);
    assert!(stored.billed_at.is_none());
    assert_eq!(
        stored.settlement_intent,
        Some(sea_orm_active_enums::SettlementIntent::Deferred)
    );
}

#[tokio::test]
async fn test_cc_writes_apply_while_unpaid() {
    let db = setup_db().await;
    let repo = LedgerRepository::new(db.clone());
    let ws = Uuid::new_v4();
    let entry = repo
        .create(
            ws,
            CreateEntryInput::new(EntryType::Expense, 450, "Fuel", may(4))
                .credit_card(Some(SettlementIntent::Immediate)),
        )
        .await
        .unwrap();

    write_settlement_intent(&db, ws, entry.id, SettlementIntent::Deferred)
        .await
        .unwrap();
    write_billed_at(&db, ws, entry.id, Some(Utc::now().into()), CcState::Billed)
        .await
        .unwrap();

    let stored = repo.get_by_id(ws, entry.id).await.unwrap();
    assert!(stored.billed_at.is_some());
    assert_eq!(
        stored.settlement_intent,
        Some(sea_orm_active_enums::SettlementIntent::Deferred)
    );

    // Another workspace never matches.
    let foreign = write_settlement_intent(&db, Uuid::new_v4(), entry.id, SettlementIntent::Immediate)
        .await;
    assert!(matches!(foreign, Err(LedgerError::TransactionAlreadyPaid)));
}

#[tokio::test]
async fn test_sum_by_type_reports_overflow() {
    let db = setup_db().await;
    let repo = LedgerRepository::new(db.clone());
    let ws = Uuid::new_v4();

    stored_expense(&db, ws, MAX_AMOUNT_MINOR).await;
    stored_expense(&db, ws, MAX_AMOUNT_MINOR).await;
    let total = repo
        .sum_by_type(ws, EntryType::Expense, None, None)
        .await
        .unwrap();
    assert_eq!(total, 2 * MAX_AMOUNT_MINOR);

    stored_expense(&db, ws, i64::MAX).await;
    assert!(matches!(
        repo.sum_by_type(ws, EntryType::Expense, None, None).await,
        Err(LedgerError::TotalOverflow)
    ));
}
