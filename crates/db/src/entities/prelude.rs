//! Entity re-exports.

pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::loan_payments::Entity as LoanPayments;
pub use super::loan_providers::Entity as LoanProviders;
pub use super::loans::Entity as Loans;
pub use super::recurring_templates::Entity as RecurringTemplates;
pub use super::transaction_groups::Entity as TransactionGroups;
