//! Initial migration: every resource table, soft-delete markers and scope indexes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().primary_key().to_owned()
}

fn uuid<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn uuid_null<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().null().to_owned()
}

fn text<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).string().not_null().to_owned()
}

fn text_null<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).string().null().to_owned()
}

fn flag<T: IntoIden>(col: T, default: bool) -> ColumnDef {
    ColumnDef::new(col)
        .boolean()
        .not_null()
        .default(default)
        .to_owned()
}

fn stamp<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn stamp_null<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .null()
        .to_owned()
}

async fn index<T, C>(manager: &SchemaManager<'_>, name: &str, table: T, col: C) -> Result<(), DbErr>
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(name)
                .table(table)
                .col(col)
                .to_owned(),
        )
        .await
}

async fn create_projects_and_users(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Projects::Table)
                .if_not_exists()
                .col(id(Projects::Id))
                .col(text(Projects::Name))
                .col(text_null(Projects::Description))
                .col(flag(Projects::IsActive, true))
                .col(stamp(Projects::CreatedAt))
                .col(stamp(Projects::UpdatedAt))
                .col(stamp_null(Projects::DeletedAt))
                .to_owned(),
        )
        .await?;

    manager
        .create_table(
            Table::create()
                .table(Users::Table)
                .if_not_exists()
                .col(id(Users::Id))
                .col(uuid_null(Users::ProjectId))
                .col(text(Users::Name))
                .col(text(Users::Email))
                .col(text(Users::Role))
                .col(stamp(Users::CreatedAt))
                .to_owned(),
        )
        .await?;
    index(manager, "idx_users_project", Users::Table, Users::ProjectId).await
}

async fn create_catalog(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Brands::Table)
                .if_not_exists()
                .col(id(Brands::Id))
                .col(uuid(Brands::ProjectId))
                .col(uuid(Brands::OwnerId))
                .col(text(Brands::Name))
                .col(text_null(Brands::Description))
                .col(flag(Brands::IsActive, true))
                .col(stamp(Brands::CreatedAt))
                .col(stamp(Brands::UpdatedAt))
                .col(stamp_null(Brands::DeletedAt))
                .to_owned(),
        )
        .await?;
    index(manager, "idx_brands_project", Brands::Table, Brands::ProjectId).await?;
    index(manager, "idx_brands_owner", Brands::Table, Brands::OwnerId).await?;

    manager
        .create_table(
            Table::create()
                .table(Categories::Table)
                .if_not_exists()
                .col(id(Categories::Id))
                .col(uuid(Categories::ProjectId))
                .col(uuid(Categories::OwnerId))
                .col(uuid_null(Categories::ParentId))
                .col(text(Categories::Name))
                .col(flag(Categories::IsActive, true))
                .col(stamp(Categories::CreatedAt))
                .col(stamp(Categories::UpdatedAt))
                .col(stamp_null(Categories::DeletedAt))
                .to_owned(),
        )
        .await?;
    index(manager, "idx_categories_project", Categories::Table, Categories::ProjectId).await?;
    index(manager, "idx_categories_owner", Categories::Table, Categories::OwnerId).await?;

    manager
        .create_table(
            Table::create()
                .table(Products::Table)
                .if_not_exists()
                .col(id(Products::Id))
                .col(uuid(Products::ProjectId))
                .col(uuid_null(Products::BrandId))
                .col(uuid_null(Products::CategoryId))
                .col(text(Products::Name))
                .col(text(Products::Sku))
                .col(ColumnDef::new(Products::PriceCents).big_integer().not_null())
                .col(flag(Products::InStock, true))
                .col(stamp(Products::CreatedAt))
                .col(stamp(Products::UpdatedAt))
                .col(stamp_null(Products::DeletedAt))
                .to_owned(),
        )
        .await?;
    index(manager, "idx_products_project", Products::Table, Products::ProjectId).await?;
    index(manager, "idx_products_brand", Products::Table, Products::BrandId).await
}

async fn create_surveys_and_feedback(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Surveys::Table)
                .if_not_exists()
                .col(id(Surveys::Id))
                .col(uuid(Surveys::ProjectId))
                .col(text(Surveys::Title))
                .col(text_null(Surveys::Description))
                .col(flag(Surveys::IsPublished, false))
                .col(stamp(Surveys::CreatedAt))
                .col(stamp(Surveys::UpdatedAt))
                .col(stamp_null(Surveys::DeletedAt))
                .to_owned(),
        )
        .await?;
    index(manager, "idx_surveys_project", Surveys::Table, Surveys::ProjectId).await?;

    manager
        .create_table(
            Table::create()
                .table(Feedbacks::Table)
                .if_not_exists()
                .col(id(Feedbacks::Id))
                .col(uuid(Feedbacks::ProjectId))
                .col(uuid(Feedbacks::SurveyId))
                .col(uuid_null(Feedbacks::UserId))
                .col(ColumnDef::new(Feedbacks::Rating).integer().not_null())
                .col(text_null(Feedbacks::Comment))
                .col(stamp(Feedbacks::CreatedAt))
                .to_owned(),
        )
        .await?;
    index(manager, "idx_feedbacks_project", Feedbacks::Table, Feedbacks::ProjectId).await?;
    index(manager, "idx_feedbacks_survey", Feedbacks::Table, Feedbacks::SurveyId).await
}

async fn create_locations(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Locations::Table)
                .if_not_exists()
                .col(id(Locations::Id))
                .col(uuid(Locations::ProjectId))
                .col(text(Locations::Name))
                .col(text(Locations::Address))
                .col(text(Locations::City))
                .col(flag(Locations::IsActive, true))
                .col(stamp(Locations::CreatedAt))
                .col(stamp(Locations::UpdatedAt))
                .to_owned(),
        )
        .await?;
    index(manager, "idx_locations_project", Locations::Table, Locations::ProjectId).await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_projects_and_users(manager).await?;
        create_catalog(manager).await?;
        create_surveys_and_feedback(manager).await?;
        create_locations(manager).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Locations::Table.into_iden(),
            Feedbacks::Table.into_iden(),
            Surveys::Table.into_iden(),
            Products::Table.into_iden(),
            Categories::Table.into_iden(),
            Brands::Table.into_iden(),
            Users::Table.into_iden(),
            Projects::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    ProjectId,
    Name,
    Email,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Brands {
    Table,
    Id,
    ProjectId,
    OwnerId,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    ProjectId,
    OwnerId,
    ParentId,
    Name,
    IsActive,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    ProjectId,
    BrandId,
    CategoryId,
    Name,
    Sku,
    PriceCents,
    InStock,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Surveys {
    Table,
    Id,
    ProjectId,
    Title,
    Description,
    IsPublished,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Feedbacks {
    Table,
    Id,
    ProjectId,
    SurveyId,
    UserId,
    Rating,
    Comment,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    ProjectId,
    Name,
    Address,
    City,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
