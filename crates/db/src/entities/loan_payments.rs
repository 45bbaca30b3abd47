//! `SeaORM` Entity for loan_payments table.

use ledgerly_core::loan::PaymentRow;
use ledgerly_shared::types::YearMonth;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loan_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub loan_id: Uuid,
    pub due_year: i32,
    pub due_month: i32,
    pub amount_minor: i64,
    pub is_paid: bool,
    pub paid_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loans::Entity",
        from = "Column::LoanId",
        to = "super::loans::Column::Id",
        on_delete = "Cascade"
    )]
    Loans,
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::loans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Due month, if the stored year/month pair is valid.
    #[must_use]
    pub fn due(&self) -> Option<YearMonth> {
        let month = u32::try_from(self.due_month).ok()?;
        YearMonth::new(self.due_year, month).ok()
    }

    /// The sequencing view of this payment.
    #[must_use]
    pub fn payment_row(&self) -> Option<PaymentRow> {
        Some(PaymentRow {
            month: self.due()?,
            is_paid: self.is_paid,
            amount_minor: self.amount_minor,
        })
    }
}
