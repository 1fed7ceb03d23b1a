use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::Tracked;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Version stamp compared on every staged update.
    #[sea_orm(default_value = 0)]
    pub concurrency_token: i32,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl Tracked for Entity {
    fn concurrency_token() -> Option<Column> {
        Some(Column::ConcurrencyToken)
    }
}
