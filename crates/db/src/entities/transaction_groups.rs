//! `SeaORM` Entity for transaction_groups table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    /// `YYYY-MM`.
    pub month: String,
    pub auto_detected: bool,
    pub loan_provider_id: Option<Uuid>,
    pub auto_detect_key: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
    #[sea_orm(
        belongs_to = "super::loan_providers::Entity",
        from = "Column::LoanProviderId",
        to = "super::loan_providers::Column::Id",
        on_delete = "SetNull"
    )]
    LoanProviders,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl Related<super::loan_providers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanProviders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
