//! Demo data: two projects with a manager each, one platform admin, and a
//! handful of rows per resource. Ids are fixed so callers can be written by
//! hand; re-running is a no-op.

use chrono::{DateTime, Duration, Utc};
use opskit_security::Caller;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set, TransactionTrait};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::infra::storage::entity::{brand, category, feedback, location, product, project, survey, user};

pub const NORTH_PROJECT: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0001);
pub const SOUTH_PROJECT: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0002);
pub const ADMIN_USER: Uuid = Uuid::from_u128(0x0000_0002_0000_4000_8000_0000_0000_0001);
pub const NORTH_MANAGER: Uuid = Uuid::from_u128(0x0000_0002_0000_4000_8000_0000_0000_0002);
pub const SOUTH_MANAGER: Uuid = Uuid::from_u128(0x0000_0002_0000_4000_8000_0000_0000_0003);

/// Callers matching the seeded users.
#[derive(Clone, Debug, Serialize)]
pub struct DemoCallers {
    pub admin: Caller,
    pub north_manager: Caller,
    pub south_manager: Caller,
}

impl DemoCallers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            admin: Caller::new(ADMIN_USER, "super_admin"),
            north_manager: Caller::new(NORTH_MANAGER, "manager").with_project(NORTH_PROJECT),
            south_manager: Caller::new(SOUTH_MANAGER, "manager").with_project(SOUTH_PROJECT),
        }
    }
}

impl Default for DemoCallers {
    fn default() -> Self {
        Self::new()
    }
}

fn base_time() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000)
}

/// Insert the demo data set in one transaction.
///
/// Returns `false` when it was already present.
///
/// # Errors
/// Propagates database errors; nothing is written on failure.
pub async fn seed_demo<C>(conn: &C) -> Result<bool, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    if project::Entity::find_by_id(NORTH_PROJECT)
        .one(conn)
        .await?
        .is_some()
    {
        info!("demo data already present");
        return Ok(false);
    }

    let txn = conn.begin().await?;
    let t0 = base_time();
    let at = |minutes: i64| t0 + Duration::minutes(minutes);

    for (id, name, minute) in [(NORTH_PROJECT, "North", 0), (SOUTH_PROJECT, "South", 1)] {
        project::ActiveModel {
            id: Set(id),
            name: Set(name.to_owned()),
            description: Set(Some(format!("{name} region stores"))),
            is_active: Set(true),
            created_at: Set(at(minute)),
            updated_at: Set(at(minute)),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;
    }

    for (id, project_id, name, role) in [
        (ADMIN_USER, None, "Ada Admin", "super_admin"),
        (NORTH_MANAGER, Some(NORTH_PROJECT), "Nora North", "manager"),
        (SOUTH_MANAGER, Some(SOUTH_PROJECT), "Sam South", "manager"),
    ] {
        user::ActiveModel {
            id: Set(id),
            project_id: Set(project_id),
            name: Set(name.to_owned()),
            email: Set(format!("{}@retail.example", name.to_lowercase().replace(' ', "."))),
            role: Set(role.to_owned()),
            created_at: Set(t0),
        }
        .insert(&txn)
        .await?;
    }

    for (project_id, owner_id, prefix, offset) in [
        (NORTH_PROJECT, NORTH_MANAGER, "North", 0),
        (SOUTH_PROJECT, SOUTH_MANAGER, "South", 100),
    ] {
        seed_catalog(&txn, project_id, owner_id, prefix, &|m: i64| at(offset + m)).await?;
    }

    txn.commit().await?;
    info!("demo data seeded");
    Ok(true)
}

async fn seed_catalog<C, F>(
    conn: &C,
    project_id: Uuid,
    owner_id: Uuid,
    prefix: &str,
    at: &F,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    F: Fn(i64) -> DateTime<Utc>,
{
    let brand = brand::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        owner_id: Set(owner_id),
        name: Set(format!("{prefix} Outfitters")),
        description: Set(Some("Outdoor gear".to_owned())),
        is_active: Set(true),
        created_at: Set(at(2)),
        updated_at: Set(at(2)),
        deleted_at: Set(None),
    }
    .insert(conn)
    .await?;

    let category = category::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        owner_id: Set(owner_id),
        parent_id: Set(None),
        name: Set("Footwear".to_owned()),
        is_active: Set(true),
        created_at: Set(at(3)),
        updated_at: Set(at(3)),
        deleted_at: Set(None),
    }
    .insert(conn)
    .await?;

    for (i, (name, price)) in [("Trail Runner", 8_900), ("Hiking Boot", 14_900), ("Sandal", 3_500)]
        .into_iter()
        .enumerate()
    {
        let minute = 4 + i64::try_from(i).unwrap_or_default();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            brand_id: Set(Some(brand.id)),
            category_id: Set(Some(category.id)),
            name: Set(name.to_owned()),
            sku: Set(format!("{}-{:03}", prefix.to_uppercase(), i + 1)),
            price_cents: Set(price),
            in_stock: Set(price < 10_000),
            created_at: Set(at(minute)),
            updated_at: Set(at(minute)),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await?;
    }

    seed_survey(conn, project_id, owner_id, prefix, at).await?;

    location::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        name: Set(format!("{prefix} Flagship")),
        address: Set("1 Market Street".to_owned()),
        city: Set(prefix.to_owned()),
        is_active: Set(true),
        created_at: Set(at(20)),
        updated_at: Set(at(20)),
    }
    .insert(conn)
    .await?;

    Ok(())
}

async fn seed_survey<C, F>(
    conn: &C,
    project_id: Uuid,
    author_id: Uuid,
    prefix: &str,
    at: &F,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    F: Fn(i64) -> DateTime<Utc>,
{
    let survey = survey::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        title: Set(format!("{prefix} store satisfaction")),
        description: Set(None),
        is_published: Set(true),
        created_at: Set(at(10)),
        updated_at: Set(at(10)),
        deleted_at: Set(None),
    }
    .insert(conn)
    .await?;

    for (minute, rating, comment) in [(11, 5, "Friendly staff"), (12, 3, "Long queue")] {
        feedback::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            survey_id: Set(survey.id),
            user_id: Set(Some(author_id)),
            rating: Set(rating),
            comment: Set(Some(comment.to_owned())),
            created_at: Set(at(minute)),
        }
        .insert(conn)
        .await?;
    }

    Ok(())
}
