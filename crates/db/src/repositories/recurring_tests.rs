//! Tests for the keyed projection insert.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
    prelude::DateTimeWithTimeZone,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use ledgerly_core::ledger::{CcFields, EntryType};
use ledgerly_core::recurring::RecurringService;
use ledgerly_shared::types::YearMonth;

use super::{CreateTemplateInput, RecurringRepository, insert_projection};
use crate::entities::{ledger_entries, recurring_templates};
use crate::migration::Migrator;
use crate::repositories::ledger::{CreateEntryInput, EntryOrigin, entry_active_model};
use crate::repositories::is_unique_violation;

async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

fn june() -> YearMonth {
    "2026-06".parse().unwrap()
}

async fn rent_template(db: &DatabaseConnection, workspace_id: Uuid) -> recurring_templates::Model {
    RecurringRepository::new(db.clone())
        .create_template(
            workspace_id,
            CreateTemplateInput {
                name: "Rent".to_string(),
                entry_type: "expense".to_string(),
                amount_minor: 1_500_000,
                due_day: 31,
                category_id: None,
                account_id: None,
                starts_on: None,
                ends_on: None,
            },
        )
        .await
        .unwrap()
}

fn projection(template: &recurring_templates::Model, month: YearMonth) -> ledger_entries::ActiveModel {
    let key = RecurringService::projection_key(template.id, month);
    entry_active_model(
        template.workspace_id,
        CreateEntryInput::new(
            EntryType::Expense,
            template.amount_minor,
            template.name.clone(),
            NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
        ),
        CcFields {
            is_cc_payment: false,
            settlement_intent: None,
        },
        EntryOrigin::projection(template.id, key),
        Utc::now().into(),
    )
}

#[tokio::test]
async fn test_duplicate_projection_key_is_unique_violation() {
    let db = setup_db().await;
    let ws = Uuid::new_v4();
    let template = rent_template(&db, ws).await;

    projection(&template, june()).insert(&db).await.unwrap();
    let err = projection(&template, june()).insert(&db).await.unwrap_err();
    assert!(is_unique_violation(&err));

    // Other months of the same template are free.
    projection(&template, "2026-07".parse().unwrap())
        .insert(&db)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_insert_projection_skips_taken_key() {
    let db = setup_db().await;
    let ws = Uuid::new_v4();
    let template = rent_template(&db, ws).await;
    let now: DateTimeWithTimeZone = Utc::now().into();

    let first = insert_projection(&db, &template, june(), now).await.unwrap();
    let entry_id = first.unwrap();

    // A second pass that saw no projection before inserting loses the key.
    let second = insert_projection(&db, &template, june(), now).await.unwrap();
    assert!(second.is_none());

    let children = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::TemplateId.eq(template.id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, entry_id);
    assert_eq!(
        children[0].entry_date,
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    );
    assert!(children[0].is_projected);
}
