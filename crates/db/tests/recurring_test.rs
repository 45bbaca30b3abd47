//! Integration tests for recurring templates and projection regeneration.

mod common;

use common::{date, setup_db, ym};
use ledgerly_core::recurring::RecurringError;
use ledgerly_db::entities::{ledger_entries, recurring_templates};
use ledgerly_db::repositories::{
    CreateTemplateInput, LedgerRepository, RecurringRepository, UpdateEntryInput,
    UpdateTemplateInput,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

fn rent(due_day: u32) -> CreateTemplateInput {
    CreateTemplateInput {
        name: "Rent".to_string(),
        entry_type: "expense".to_string(),
        amount_minor: 1_500_000,
        due_day,
        category_id: None,
        account_id: None,
        starts_on: None,
        ends_on: None,
    }
}

async fn children(db: &DatabaseConnection, template_id: Uuid) -> Vec<ledger_entries::Model> {
    ledger_entries::Entity::find()
        .filter(ledger_entries::Column::TemplateId.eq(template_id))
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_template_validates() {
    let db = setup_db().await;
    let repo = RecurringRepository::new(db);
    let ws = Uuid::new_v4();

    assert!(matches!(
        repo.create_template(ws, rent(0)).await,
        Err(RecurringError::InvalidDueDay(0))
    ));
    let mut transfer = rent(1);
    transfer.entry_type = "transfer".to_string();
    assert!(matches!(
        repo.create_template(ws, transfer).await,
        Err(RecurringError::InvalidEntryType(_))
    ));

    let mut huge = rent(1);
    huge.amount_minor = i64::MAX;
    assert!(matches!(
        repo.create_template(ws, huge).await,
        Err(RecurringError::AmountTooLarge { .. })
    ));

    let template = repo.create_template(ws, rent(1)).await.unwrap();
    assert!(template.is_active);
    assert_eq!(repo.list_templates(ws).await.unwrap().len(), 1);
    assert!(matches!(
        repo.get_template(Uuid::new_v4(), template.id).await,
        Err(RecurringError::TemplateNotFound(_))
    ));
}

#[tokio::test]
async fn test_generate_clamps_due_day() {
    let db = setup_db().await;
    let repo = RecurringRepository::new(db.clone());
    let ws = Uuid::new_v4();
    let template = repo.create_template(ws, rent(31)).await.unwrap();

    let result = repo.generate_for_month(ws, ym("2026-02")).await.unwrap();

    assert_eq!(result.created_count(), 1);
    let entries = children(&db, template.id).await;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.entry_date, date(2026, 2, 28));
    assert!(entry.is_projected);
    assert_eq!(
        entry.projection_key.as_deref(),
        Some(format!("{}:2026-02", template.id).as_str())
    );
    assert_eq!(entry.description, "Rent");
}

#[tokio::test]
async fn test_generate_is_idempotent() {
    let db = setup_db().await;
    let repo = RecurringRepository::new(db.clone());
    let ws = Uuid::new_v4();
    let template = repo.create_template(ws, rent(1)).await.unwrap();

    repo.generate_for_month(ws, ym("2026-05")).await.unwrap();
    let again = repo.generate_for_month(ws, ym("2026-05")).await.unwrap();

    assert_eq!(again.created_count(), 0);
    assert_eq!(again.skipped_templates, vec![template.id]);
    assert_eq!(children(&db, template.id).await.len(), 1);
}

#[tokio::test]
async fn test_generate_does_not_resurrect_deleted_occurrence() {
    let db = setup_db().await;
    let repo = RecurringRepository::new(db.clone());
    let ws = Uuid::new_v4();
    let template = repo.create_template(ws, rent(1)).await.unwrap();
    let generated = repo.generate_for_month(ws, ym("2026-05")).await.unwrap();

    LedgerRepository::new(db.clone())
        .soft_delete(ws, generated.created_entry_ids[0])
        .await
        .unwrap();
    let again = repo.generate_for_month(ws, ym("2026-05")).await.unwrap();

    assert_eq!(again.created_count(), 0);
    assert_eq!(children(&db, template.id).await.len(), 1);
}

#[tokio::test]
async fn test_generate_respects_window_and_active_flag() {
    let db = setup_db().await;
    let repo = RecurringRepository::new(db);
    let ws = Uuid::new_v4();
    let mut windowed = rent(10);
    windowed.starts_on = Some(date(2026, 3, 15));
    windowed.ends_on = Some(date(2026, 6, 1));
    let windowed = repo.create_template(ws, windowed).await.unwrap();
    let paused = repo.create_template(ws, rent(10)).await.unwrap();
    repo.update_template(
        ws,
        paused.id,
        UpdateTemplateInput {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(
        repo.generate_for_month(ws, ym("2026-02"))
            .await
            .unwrap()
            .created_count(),
        0
    );
    let march = repo.generate_for_month(ws, ym("2026-03")).await.unwrap();
    assert_eq!(march.created_count(), 1);
    assert_eq!(
        repo.generate_for_month(ws, ym("2026-07"))
            .await
            .unwrap()
            .created_count(),
        0
    );
    assert!(!march.skipped_templates.contains(&windowed.id));
}

#[tokio::test]
async fn test_update_template_deletes_only_projections() {
    let db = setup_db().await;
    let repo = RecurringRepository::new(db.clone());
    let ws = Uuid::new_v4();
    let template = repo.create_template(ws, rent(1)).await.unwrap();
    for month in ["2026-04", "2026-05", "2026-06"] {
        repo.generate_for_month(ws, ym(month)).await.unwrap();
    }

    // Editing the April occurrence materializes it.
    let april = children(&db, template.id)
        .await
        .into_iter()
        .find(|e| e.entry_date == date(2026, 4, 1))
        .unwrap();
    let edited = LedgerRepository::new(db.clone())
        .update(
            ws,
            april.id,
            UpdateEntryInput {
                amount_minor: Some(1_400_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!edited.is_projected);
    assert_eq!(edited.template_id, Some(template.id));

    let (updated, result) = repo
        .update_template(
            ws,
            template.id,
            UpdateTemplateInput {
                amount_minor: Some(1_600_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.amount_minor, 1_600_000);
    assert_eq!(result.projections_deleted, 2);
    let remaining = children(&db, template.id).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, april.id);
    assert_eq!(remaining[0].amount_minor, 1_400_000);

    let regenerated = repo.generate_for_month(ws, ym("2026-05")).await.unwrap();
    assert_eq!(regenerated.created_count(), 1);
    let may = ledger_entries::Entity::find_by_id(regenerated.created_entry_ids[0])
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(may.amount_minor, 1_600_000);
}

#[tokio::test]
async fn test_update_template_rejects_invalid_merge() {
    let db = setup_db().await;
    let repo = RecurringRepository::new(db.clone());
    let ws = Uuid::new_v4();
    let template = repo.create_template(ws, rent(1)).await.unwrap();
    repo.generate_for_month(ws, ym("2026-05")).await.unwrap();

    assert!(matches!(
        repo.update_template(
            ws,
            template.id,
            UpdateTemplateInput {
                amount_minor: Some(0),
                ..Default::default()
            },
        )
        .await,
        Err(RecurringError::NonPositiveAmount(0))
    ));
    assert_eq!(children(&db, template.id).await.len(), 1);
}

#[tokio::test]
async fn test_delete_template_orphans_actuals() {
    let db = setup_db().await;
    let repo = RecurringRepository::new(db.clone());
    let ws = Uuid::new_v4();
    let template = repo.create_template(ws, rent(1)).await.unwrap();
    for month in ["2026-04", "2026-05"] {
        repo.generate_for_month(ws, ym(month)).await.unwrap();
    }
    let actual = children(&db, template.id).await[0].id;
    LedgerRepository::new(db.clone())
        .update(
            ws,
            actual,
            UpdateEntryInput {
                description: Some("Rent April".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = repo.delete_template(ws, template.id).await.unwrap();

    assert_eq!(result.projections_deleted, 1);
    assert_eq!(result.actuals_orphaned, 1);
    assert!(children(&db, template.id).await.is_empty());
    let kept = ledger_entries::Entity::find_by_id(actual)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(kept.template_id.is_none());
    assert!(kept.deleted_at.is_none());

    let row = recurring_templates::Entity::find_by_id(template.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(row.deleted_at.is_some());
    assert!(repo.list_templates(ws).await.unwrap().is_empty());
    assert_eq!(
        repo.generate_for_month(ws, ym("2026-06"))
            .await
            .unwrap()
            .created_count(),
        0
    );
}
