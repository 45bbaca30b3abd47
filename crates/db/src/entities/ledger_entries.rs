//! `SeaORM` Entity for ledger_entries table.

use ledgerly_core::ledger::CcSnapshot;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntrySource, EntryType, SettlementIntent};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub entry_type: EntryType,
    pub amount_minor: i64,
    pub description: String,
    pub entry_date: Date,
    pub is_paid: bool,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub transfer_account_id: Option<Uuid>,
    pub transfer_pair_id: Option<Uuid>,
    pub source: EntrySource,
    pub template_id: Option<Uuid>,
    pub is_projected: bool,
    pub projection_key: Option<String>,
    pub loan_payment_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub is_cc_payment: bool,
    pub settlement_intent: Option<SettlementIntent>,
    pub billed_at: Option<DateTimeWithTimeZone>,
    pub settled_at: Option<DateTimeWithTimeZone>,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transaction_groups::Entity",
        from = "Column::GroupId",
        to = "super::transaction_groups::Column::Id",
        on_delete = "SetNull"
    )]
    TransactionGroups,
    #[sea_orm(
        belongs_to = "super::recurring_templates::Entity",
        from = "Column::TemplateId",
        to = "super::recurring_templates::Column::Id",
        on_delete = "SetNull"
    )]
    RecurringTemplates,
    #[sea_orm(
        belongs_to = "super::loan_payments::Entity",
        from = "Column::LoanPaymentId",
        to = "super::loan_payments::Column::Id",
        on_delete = "SetNull"
    )]
    LoanPayments,
}

impl Related<super::transaction_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionGroups.def()
    }
}

impl Related<super::recurring_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTemplates.def()
    }
}

impl Related<super::loan_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The CC-relevant columns of this entry.
    #[must_use]
    pub fn cc_snapshot(&self) -> CcSnapshot {
        CcSnapshot {
            is_cc_payment: self.is_cc_payment,
            settlement_intent: self.settlement_intent.map(Into::into),
            is_paid: self.is_paid,
            billed_at: self.billed_at.map(|at| at.to_utc()),
        }
    }
}
