use sea_orm::{
    ActiveModelBehavior, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel, Select, TransactionTrait,
};
use tracing::{debug, warn};

use super::change_set::StagedChange;
use super::error::DataError;
use super::repository::{Repository, Tracked};

/// A transaction boundary over one pooled connection.
///
/// Repositories obtained from [`UnitOfWork::repository`] stage changes here;
/// [`UnitOfWork::save_changes`] is the only place they are written. At most
/// one transaction is open at a time. Dropping a unit of work with an open
/// transaction rolls it back.
pub struct UnitOfWork {
    db: DatabaseConnection,
    txn: Option<DatabaseTransaction>,
    pending: Vec<Box<dyn StagedChange>>,
}

impl UnitOfWork {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            txn: None,
            pending: Vec::new(),
        }
    }

    /// A repository for entity `E` staging into this unit of work.
    pub fn repository<E>(&mut self) -> Repository<'_, E>
    where
        E: Tracked,
        E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync + 'static,
        E::ActiveModel: ActiveModelBehavior + Send + Sync + 'static,
    {
        Repository::new(self)
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub async fn begin_transaction(&mut self) -> Result<(), DataError> {
        if self.txn.is_some() {
            return Err(DataError::TransactionAlreadyActive);
        }
        self.txn = Some(self.db.begin().await?);
        debug!("Transaction started");
        Ok(())
    }

    /// Write every staged change, in staging order, and return the number of
    /// affected rows.
    ///
    /// Inside an open transaction the writes join it; otherwise the flush runs
    /// in its own transaction so a failed save writes nothing. Changes are
    /// consumed either way.
    pub async fn save_changes(&mut self) -> Result<u64, DataError> {
        let changes = std::mem::take(&mut self.pending);
        if changes.is_empty() {
            return Ok(0);
        }

        let affected = match &self.txn {
            Some(txn) => apply_all(changes, txn).await?,
            None => {
                let txn = self.db.begin().await?;
                let affected = apply_all(changes, &txn).await?;
                txn.commit().await?;
                affected
            }
        };

        debug!(affected, "Saved staged changes");
        Ok(affected)
    }

    /// Save, then commit the open transaction.
    pub async fn commit(&mut self) -> Result<(), DataError> {
        if self.txn.is_none() {
            return Err(DataError::NoActiveTransaction);
        }
        self.save_changes().await?;

        let txn = self.txn.take().ok_or(DataError::NoActiveTransaction)?;
        txn.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Roll back the open transaction and drop unsaved changes. A no-op when
    /// no transaction is open.
    pub async fn rollback(&mut self) -> Result<(), DataError> {
        let Some(txn) = self.txn.take() else {
            return Ok(());
        };
        self.pending.clear();
        txn.rollback().await?;
        debug!("Transaction rolled back");
        Ok(())
    }

    pub(crate) fn stage(&mut self, change: Box<dyn StagedChange>) {
        self.pending.push(change);
    }

    pub(crate) async fn fetch_one<E: EntityTrait>(
        &self,
        select: Select<E>,
    ) -> Result<Option<E::Model>, DbErr> {
        match &self.txn {
            Some(txn) => select.one(txn).await,
            None => select.one(&self.db).await,
        }
    }

    pub(crate) async fn fetch_all<E: EntityTrait>(
        &self,
        select: Select<E>,
    ) -> Result<Vec<E::Model>, DbErr> {
        match &self.txn {
            Some(txn) => select.all(txn).await,
            None => select.all(&self.db).await,
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.txn.is_some() {
            warn!("Unit of work dropped with an open transaction; rolling back");
        }
    }
}

async fn apply_all(
    changes: Vec<Box<dyn StagedChange>>,
    txn: &DatabaseTransaction,
) -> Result<u64, DataError> {
    let mut affected = 0;
    for change in changes {
        affected += change.apply(txn).await?;
    }
    Ok(affected)
}
