//! Survey answer. Removed for real, there is no soft-delete marker.

use opskit_db::secure::ScopableEntity;
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "feedbacks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub survey_id: Uuid,
    pub user_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ScopableEntity for Entity {
    fn resource_col() -> Self::Column {
        Column::Id
    }

    fn deleted_at_col() -> Option<Self::Column> {
        None
    }
}
