//! `SeaORM` Entity for recurring_templates table.

use ledgerly_core::recurring::TemplateWindow;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::EntryType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub entry_type: EntryType,
    pub amount_minor: i64,
    pub due_day: i32,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub is_active: bool,
    pub starts_on: Option<Date>,
    pub ends_on: Option<Date>,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Scheduling window of the template.
    #[must_use]
    pub fn window(&self) -> TemplateWindow {
        TemplateWindow {
            is_active: self.is_active && self.deleted_at.is_none(),
            starts_on: self.starts_on,
            ends_on: self.ends_on,
        }
    }
}
