use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Database error: {0}")]
    Db(#[from] DbErr),

    #[error("A transaction is already active on this unit of work")]
    TransactionAlreadyActive,

    #[error("No active transaction to commit")]
    NoActiveTransaction,

    /// A staged update matched no row: the row was deleted or its
    /// concurrency token changed since it was read.
    #[error("Concurrency conflict while updating {entity}")]
    ConcurrencyConflict { entity: String },
}

impl DataError {
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, DataError::ConcurrencyConflict { .. })
    }
}
