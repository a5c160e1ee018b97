#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use opskit_db::crud::RelationGraph;
use opskit_db::secure::ScopableEntity;
use opskit_db::{ConnectOpts, DbHandle};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Schema, Set};
use uuid::Uuid;

pub mod project {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
    #[sea_orm(table_name = "projects")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
        pub code: String,
        pub created_at: DateTimeUtc,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod brand {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
    #[sea_orm(table_name = "brands")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub project_id: Uuid,
        pub owner_id: Uuid,
        pub name: String,
        pub created_at: DateTimeUtc,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod product {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
    #[sea_orm(table_name = "products")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub project_id: Uuid,
        pub brand_id: Option<Uuid>,
        pub name: String,
        pub sku: String,
        pub price_cents: i64,
        pub in_stock: bool,
        pub created_at: DateTimeUtc,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod review {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
    #[sea_orm(table_name = "reviews")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub project_id: Uuid,
        pub product_id: Uuid,
        pub user_id: Option<Uuid>,
        pub rating: i32,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod user {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl ScopableEntity for project::Entity {
    fn resource_col() -> Self::Column {
        project::Column::Id
    }
    fn deleted_at_col() -> Option<Self::Column> {
        Some(project::Column::DeletedAt)
    }
}

impl ScopableEntity for brand::Entity {
    fn resource_col() -> Self::Column {
        brand::Column::Id
    }
    fn deleted_at_col() -> Option<Self::Column> {
        Some(brand::Column::DeletedAt)
    }
}

impl ScopableEntity for product::Entity {
    fn resource_col() -> Self::Column {
        product::Column::Id
    }
    fn deleted_at_col() -> Option<Self::Column> {
        Some(product::Column::DeletedAt)
    }
}

impl ScopableEntity for review::Entity {
    fn resource_col() -> Self::Column {
        review::Column::Id
    }
    fn deleted_at_col() -> Option<Self::Column> {
        None
    }
}

impl ScopableEntity for user::Entity {
    fn resource_col() -> Self::Column {
        user::Column::Id
    }
    fn deleted_at_col() -> Option<Self::Column> {
        None
    }
}

pub fn product_graph() -> RelationGraph<product::Entity> {
    RelationGraph::new()
        .belongs_to::<project::Entity>("project", product::Column::ProjectId, project::Column::Id)
        .belongs_to::<brand::Entity>("brand", product::Column::BrandId, brand::Column::Id)
        .nested_belongs_to::<brand::Entity, project::Entity>(
            "brand",
            "project",
            brand::Column::ProjectId,
            project::Column::Id,
        )
        .has_many::<review::Entity>("reviews", product::Column::Id, review::Column::ProductId)
        .nested_belongs_to::<review::Entity, user::Entity>(
            "reviews",
            "user",
            review::Column::UserId,
            user::Column::Id,
        )
}

pub fn brand_graph() -> RelationGraph<brand::Entity> {
    RelationGraph::new().belongs_to::<project::Entity>(
        "project",
        brand::Column::ProjectId,
        project::Column::Id,
    )
}

/// Fixed base instant so ordering by `created_at` is deterministic.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

pub fn at(minutes: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(minutes)
}

pub async fn inmem_db() -> DbHandle {
    let opts = ConnectOpts {
        max_conns: Some(1),
        ..Default::default()
    };
    let db = DbHandle::connect("sqlite::memory:", opts)
        .await
        .expect("Failed to connect to database");
    let conn = db.sea();
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    for stmt in [
        schema.create_table_from_entity(project::Entity),
        schema.create_table_from_entity(brand::Entity),
        schema.create_table_from_entity(product::Entity),
        schema.create_table_from_entity(review::Entity),
        schema.create_table_from_entity(user::Entity),
    ] {
        conn.execute(backend.build(&stmt))
            .await
            .expect("Failed to create table");
    }
    db
}

pub async fn seed_project(db: &DbHandle, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    project::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        code: Set(name.to_uppercase()),
        created_at: Set(t0()),
        deleted_at: Set(None),
    }
    .insert(db.sea())
    .await
    .expect("insert project");
    id
}

pub async fn seed_brand(db: &DbHandle, project_id: Uuid, owner_id: Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    brand::ActiveModel {
        id: Set(id),
        project_id: Set(project_id),
        owner_id: Set(owner_id),
        name: Set(name.to_owned()),
        created_at: Set(t0()),
        deleted_at: Set(None),
    }
    .insert(db.sea())
    .await
    .expect("insert brand");
    id
}

pub struct NewProduct<'a> {
    pub project_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub name: &'a str,
    pub sku: &'a str,
    pub price_cents: i64,
    pub minute: i64,
}

pub async fn seed_product(db: &DbHandle, p: NewProduct<'_>) -> Uuid {
    let id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(id),
        project_id: Set(p.project_id),
        brand_id: Set(p.brand_id),
        name: Set(p.name.to_owned()),
        sku: Set(p.sku.to_owned()),
        price_cents: Set(p.price_cents),
        in_stock: Set(true),
        created_at: Set(at(p.minute)),
        deleted_at: Set(None),
    }
    .insert(db.sea())
    .await
    .expect("insert product");
    id
}

pub async fn seed_user(db: &DbHandle, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        created_at: Set(t0()),
    }
    .insert(db.sea())
    .await
    .expect("insert user");
    id
}

pub async fn seed_review(
    db: &DbHandle,
    project_id: Uuid,
    product_id: Uuid,
    user_id: Option<Uuid>,
    rating: i32,
) -> Uuid {
    let id = Uuid::new_v4();
    review::ActiveModel {
        id: Set(id),
        project_id: Set(project_id),
        product_id: Set(product_id),
        user_id: Set(user_id),
        rating: Set(rating),
        created_at: Set(t0()),
    }
    .insert(db.sea())
    .await
    .expect("insert review");
    id
}

pub async fn count_rows<E>(db: &DbHandle) -> u64
where
    E: EntityTrait,
    E::Model: Sync,
{
    use sea_orm::PaginatorTrait;
    E::find().count(db.sea()).await.expect("count")
}
