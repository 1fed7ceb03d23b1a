use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction,
    EntityName, EntityTrait, IntoActiveModel, Iterable, ModelTrait, PrimaryKeyToColumn,
    QueryFilter, Value,
};

use super::error::DataError;
use super::repository::Tracked;

/// A mutation recorded by a repository, applied by `UnitOfWork::save_changes`.
#[async_trait]
pub(crate) trait StagedChange: Send + Sync {
    /// Applies the change inside `txn`, returning the number of rows affected.
    async fn apply(self: Box<Self>, txn: &DatabaseTransaction) -> Result<u64, DataError>;
}

/// Handle to a staged insert. Resolves to the stored row, including its
/// generated key, once the owning unit of work has saved.
#[derive(Debug)]
pub struct Pending<M> {
    slot: Arc<OnceLock<M>>,
}

impl<M> Pending<M> {
    fn new() -> (Self, Arc<OnceLock<M>>) {
        let slot = Arc::new(OnceLock::new());
        (Self { slot: slot.clone() }, slot)
    }

    /// The inserted row, or `None` while the insert is still staged.
    pub fn get(&self) -> Option<&M> {
        self.slot.get()
    }

    pub fn is_saved(&self) -> bool {
        self.slot.get().is_some()
    }
}

pub(crate) struct Insert<E: EntityTrait> {
    model: E::ActiveModel,
    slot: Arc<OnceLock<E::Model>>,
}

impl<E: EntityTrait> Insert<E> {
    pub(crate) fn stage(model: E::ActiveModel) -> (Self, Pending<E::Model>) {
        let (pending, slot) = Pending::new();
        (Self { model, slot }, pending)
    }
}

#[async_trait]
impl<E> StagedChange for Insert<E>
where
    E: Tracked,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync + 'static,
    E::ActiveModel: ActiveModelBehavior + Send + Sync + 'static,
{
    async fn apply(self: Box<Self>, txn: &DatabaseTransaction) -> Result<u64, DataError> {
        let Insert { model, slot } = *self;
        let inserted = model.insert(txn).await?;
        // Each staged insert is applied exactly once, so the slot is empty here.
        let _ = slot.set(inserted);
        Ok(1)
    }
}

pub(crate) struct Update<E: EntityTrait> {
    model: E::Model,
}

impl<E: EntityTrait> Update<E> {
    pub(crate) fn stage(model: E::Model) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<E> StagedChange for Update<E>
where
    E: Tracked,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync + 'static,
    E::ActiveModel: ActiveModelBehavior + Send + Sync + 'static,
{
    async fn apply(self: Box<Self>, txn: &DatabaseTransaction) -> Result<u64, DataError> {
        let Update { model } = *self;
        let mut filter = primary_key_condition::<E>(&model);

        // Every column is written; keys only identify the row.
        let mut active = model.clone().into_active_model().reset_all();
        for key in E::PrimaryKey::iter() {
            active.not_set(key.into_column());
        }

        if let Some(column) = E::concurrency_token() {
            let current = model.get(column);
            active.set(column, next_token(&current));
            filter = filter.add(column.eq(current));
        }

        let result = E::update_many()
            .set(active)
            .filter(filter)
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DataError::ConcurrencyConflict {
                entity: E::default().table_name().to_owned(),
            });
        }
        Ok(result.rows_affected)
    }
}

pub(crate) struct Remove<E: EntityTrait> {
    model: E::Model,
}

impl<E: EntityTrait> Remove<E> {
    pub(crate) fn stage(model: E::Model) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<E> StagedChange for Remove<E>
where
    E: Tracked,
    E::Model: Send + Sync + 'static,
{
    async fn apply(self: Box<Self>, txn: &DatabaseTransaction) -> Result<u64, DataError> {
        let result = E::delete_many()
            .filter(primary_key_condition::<E>(&self.model))
            .exec(txn)
            .await?;
        Ok(result.rows_affected)
    }
}

fn primary_key_condition<E: EntityTrait>(model: &E::Model) -> Condition {
    E::PrimaryKey::iter().fold(Condition::all(), |condition, key| {
        let column = key.into_column();
        condition.add(column.eq(model.get(column)))
    })
}

/// The token written by an update. Integer tokens count up; any other value
/// is kept as-is and only guards the comparison.
fn next_token(current: &Value) -> Value {
    match current {
        Value::Int(Some(v)) => Value::Int(Some(v.wrapping_add(1))),
        Value::BigInt(Some(v)) => Value::BigInt(Some(v.wrapping_add(1))),
        other => other.clone(),
    }
}
