use opskit_db::secure::ScopableEntity;
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    pub in_stock: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ScopableEntity for Entity {
    fn resource_col() -> Self::Column {
        Column::Id
    }

    fn deleted_at_col() -> Option<Self::Column> {
        Some(Column::DeletedAt)
    }
}
