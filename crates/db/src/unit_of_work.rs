//! Workspace-scoped unit of work.
//!
//! Every multi-row mutation runs inside one [`UnitOfWork`]. It wraps a
//! `SeaORM` transaction and remembers which workspace it belongs to.
//!
//! # Usage
//!
//! ```ignore
//! use ledgerly_db::unit_of_work::UnitOfWorkExt;
//!
//! let uow = db.unit_of_work(workspace_id).await?;
//! let entry = ledger_entries::Entity::find_by_id(id).one(uow.conn()).await?;
//! // ...
//! uow.commit().await?;
//! ```
//!
//! Dropping a unit without calling [`UnitOfWork::commit`] rolls it back, so
//! an early `?` return never leaves half a mutation behind. While a unit is
//! open, every read of the same operation must go through [`UnitOfWork::conn`].

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use uuid::Uuid;

/// A database transaction bound to one workspace.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
    workspace_id: Uuid,
}

impl UnitOfWork {
    /// Begins a new unit of work for `workspace_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub async fn begin(db: &DatabaseConnection, workspace_id: Uuid) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        Ok(Self { txn, workspace_id })
    }

    /// The connection every statement of this unit must run on.
    #[must_use]
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// The workspace this unit is scoped to.
    #[must_use]
    pub const fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }

    /// Commits the unit, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls the unit back explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Extension trait for opening units of work on a connection.
#[async_trait::async_trait]
pub trait UnitOfWorkExt {
    /// Begins a unit of work scoped to `workspace_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    async fn unit_of_work(&self, workspace_id: Uuid) -> Result<UnitOfWork, DbErr>;
}

#[async_trait::async_trait]
impl UnitOfWorkExt for DatabaseConnection {
    async fn unit_of_work(&self, workspace_id: Uuid) -> Result<UnitOfWork, DbErr> {
        UnitOfWork::begin(self, workspace_id).await
    }
}
