use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::Tracked;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(indexed)]
    pub blog_id: i32,
    #[sea_orm(belongs_to, from = "blog_id", to = "id", on_delete = "Cascade")]
    pub blog: HasOne<super::blog::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

// Comments carry no version stamp: concurrent edits are last-writer-wins.
impl Tracked for Entity {}
