use std::marker::PhantomData;

use sea_orm::sea_query::IntoCondition;
use sea_orm::{
    ActiveModelBehavior, EntityTrait, IntoActiveModel, PrimaryKeyTrait, QueryFilter,
};

use super::change_set::{Insert, Pending, Remove, Update};
use super::error::DataError;
use super::unit_of_work::UnitOfWork;

/// An entity that can be handed to a [`Repository`].
pub trait Tracked: EntityTrait {
    /// Column holding the optimistic concurrency token, if the entity has one.
    ///
    /// When present, staged updates only match the row whose token still
    /// equals the token of the model being saved, and write the next token.
    fn concurrency_token() -> Option<Self::Column> {
        None
    }
}

/// CRUD access to one entity kind, bound to a [`UnitOfWork`].
///
/// Reads hit the database immediately. `add`, `update` and `remove` only
/// stage intent; nothing is written until the unit of work saves.
pub struct Repository<'a, E: Tracked> {
    uow: &'a mut UnitOfWork,
    _entity: PhantomData<E>,
}

impl<'a, E> Repository<'a, E>
where
    E: Tracked,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync + 'static,
    E::ActiveModel: ActiveModelBehavior + Send + Sync + 'static,
{
    pub(crate) fn new(uow: &'a mut UnitOfWork) -> Self {
        Self {
            uow,
            _entity: PhantomData,
        }
    }

    /// Fetch a row by primary key. A missing row is `Ok(None)`.
    pub async fn get_by_id<K>(&self, id: K) -> Result<Option<E::Model>, DataError>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        Ok(self.uow.fetch_one(E::find_by_id(id)).await?)
    }

    pub async fn get_all(&self) -> Result<Vec<E::Model>, DataError> {
        Ok(self.uow.fetch_all(E::find()).await?)
    }

    /// Fetch every row matching `filter`.
    pub async fn find_where<F>(&self, filter: F) -> Result<Vec<E::Model>, DataError>
    where
        F: IntoCondition,
    {
        Ok(self.uow.fetch_all(E::find().filter(filter)).await?)
    }

    /// Stage an insert. The returned handle resolves after the next save.
    pub fn add(&mut self, model: E::ActiveModel) -> Pending<E::Model> {
        let (change, pending) = Insert::<E>::stage(model);
        self.uow.stage(Box::new(change));
        pending
    }

    /// Stage a full update of an existing row: every column is rewritten.
    pub fn update(&mut self, model: E::Model) {
        self.uow.stage(Box::new(Update::<E>::stage(model)));
    }

    /// Stage deletion of the row identified by `model`'s primary key.
    pub fn remove(&mut self, model: E::Model) {
        self.uow.stage(Box::new(Remove::<E>::stage(model)));
    }
}
