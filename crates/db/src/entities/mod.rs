//! `SeaORM` entity definitions.

pub mod prelude;

pub mod ledger_entries;
pub mod loan_payments;
pub mod loan_providers;
pub mod loans;
pub mod recurring_templates;
pub mod sea_orm_active_enums;
pub mod transaction_groups;
