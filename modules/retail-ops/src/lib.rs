//! Retail back office: tenant-scoped listing, lookup, deletion and creation
//! of projects, brands, categories, products, surveys, feedback and
//! locations.

pub mod config;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod seed;

pub use config::RetailOpsConfig;
pub use domain::DomainError;
pub use domain::service::{ServiceContext, Services};
pub use infra::storage::migrations::Migrator;

use opskit_db::DbHandle;
use sea_orm_migration::MigratorTrait;

/// Bring the schema up to date.
///
/// # Errors
/// Propagates the failing migration's database error.
pub async fn migrate(db: &DbHandle) -> Result<(), sea_orm::DbErr> {
    Migrator::up(db.sea(), None).await
}
