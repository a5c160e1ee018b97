//! Resource services.
//!
//! Every service is a thin, declarative layer over the listing engine: it
//! names its relations, searchable fields, declared filter types and scoping
//! policy in a [`ResourceSpec`], and adds its own `create` validation. Scope
//! resolution, query parsing and error mapping live here once.

use std::sync::Arc;

use opskit_db::DbHandle;
use opskit_db::crud::{CrudEngine, Record, RelationGraph};
use opskit_db::secure::{AccessScope, ScopableEntity, SecureEntityExt};
use opskit_query::{
    DEFAULT_SORT_FIELD, FieldTypes, ListLimits, ListRequest, ListResult, parse_query_string,
};
use opskit_security::{AuthorizationError, Caller, OwnershipPolicy, ScopeResolver};
use sea_orm::{ColumnTrait, DatabaseConnection};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::DomainError;
use crate::config::RetailOpsConfig;

pub mod brand;
pub mod category;
pub mod feedback;
pub mod location;
pub mod product;
pub mod project;
pub mod survey;

pub use brand::{BrandService, NewBrand};
pub use category::{CategoryService, NewCategory};
pub use feedback::{FeedbackService, NewFeedback};
pub use location::{LocationService, NewLocation};
pub use product::{NewProduct, ProductService};
pub use project::{NewProject, ProjectService};
pub use survey::{NewSurvey, SurveyService};

/// Dependencies shared by all resource services.
#[derive(Clone, Debug)]
pub struct ServiceContext {
    db: Arc<DbHandle>,
    scopes: Arc<ScopeResolver>,
    limits: ListLimits,
}

impl ServiceContext {
    #[must_use]
    pub fn new(db: Arc<DbHandle>, scopes: ScopeResolver, limits: ListLimits) -> Self {
        Self {
            db,
            scopes: Arc::new(scopes),
            limits,
        }
    }

    #[must_use]
    pub fn from_config(db: Arc<DbHandle>, cfg: &RetailOpsConfig) -> Self {
        Self::new(db, cfg.security.scope_resolver(), cfg.listing.limits())
    }

    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        self.db.sea()
    }

    #[must_use]
    pub fn limits(&self) -> ListLimits {
        self.limits
    }

    /// Rows `caller` may touch under `policy`.
    ///
    /// # Errors
    /// `Authorization` when a non-super-admin caller has no project.
    pub fn scope(&self, caller: &Caller, policy: OwnershipPolicy) -> Result<AccessScope, DomainError> {
        let ctx = self.scopes.resolve(caller)?;
        Ok(ctx.access_scope(policy))
    }

    #[must_use]
    pub fn is_super_admin(&self, caller: &Caller) -> bool {
        self.scopes.is_super_admin(caller)
    }

    /// Project new records are created in.
    ///
    /// # Errors
    /// `Authorization` when the caller has no project, super-admins included.
    pub fn tenant_project(&self, caller: &Caller) -> Result<Uuid, DomainError> {
        self.scopes
            .resolve(caller)?
            .tenant_project_id()
            .ok_or(DomainError::Authorization(AuthorizationError::Denied(
                "creating a record requires a project",
            )))
    }

    /// Parse and normalize a raw query string.
    ///
    /// # Errors
    /// `Query` for malformed bracket keys, sort order or declared filter values.
    pub fn request(&self, raw: &str, types: &FieldTypes) -> Result<ListRequest, DomainError> {
        let tree = parse_query_string(raw, &self.limits)?;
        Ok(ListRequest::from_tree(&tree, types, &self.limits)?)
    }

    /// Check that `id` names a live row of `E` inside the caller's scope.
    ///
    /// # Errors
    /// `Validation` on `field` when it does not.
    pub async fn ensure_visible<E>(
        &self,
        caller: &Caller,
        policy: OwnershipPolicy,
        field: &str,
        id: Uuid,
    ) -> Result<(), DomainError>
    where
        E: ScopableEntity,
        E::Column: ColumnTrait + Copy,
        E::Model: Sync,
    {
        let scope = self.scope(caller, policy)?;
        let found = E::find()
            .secure()
            .scope_with(&scope)?
            .and_id(id)
            .exclude_deleted()
            .count(self.conn())
            .await?;
        if found == 0 {
            return Err(DomainError::validation(field, format!("unknown id {id}")));
        }
        Ok(())
    }
}

pub(crate) fn default_true() -> bool {
    true
}

/// Static description of one resource.
pub struct ResourceSpec<E: sea_orm::EntityTrait> {
    pub name: &'static str,
    pub graph: RelationGraph<E>,
    pub relations: &'static [&'static str],
    pub searchable: &'static [&'static str],
    pub default_sort: &'static str,
    pub field_types: FieldTypes,
    pub policy: OwnershipPolicy,
    pub soft_delete: bool,
}

impl<E> ResourceSpec<E>
where
    E: ScopableEntity,
    E::Column: ColumnTrait + Copy,
    E::Model: Serialize + Send + Sync,
{
    #[must_use]
    pub fn new(name: &'static str, graph: RelationGraph<E>, policy: OwnershipPolicy) -> Self {
        Self {
            name,
            graph,
            relations: &[],
            searchable: &[],
            default_sort: DEFAULT_SORT_FIELD,
            field_types: FieldTypes::new(),
            policy,
            soft_delete: false,
        }
    }

    fn engine<'a>(&'a self, conn: &'a DatabaseConnection) -> CrudEngine<'a, E, DatabaseConnection> {
        CrudEngine::new(conn, &self.graph)
            .alias(self.name)
            .relations(self.relations)
            .searchable(self.searchable)
            .default_sort(self.default_sort)
    }

    /// # Errors
    /// Query, authorization and engine errors, see [`DomainError`].
    pub async fn list(
        &self,
        ctx: &ServiceContext,
        caller: &Caller,
        raw_query: &str,
    ) -> Result<ListResult<Record<E::Model>>, DomainError> {
        let scope = ctx.scope(caller, self.policy)?;
        let request = ctx.request(raw_query, &self.field_types).inspect_err(|e| {
            warn!(resource = self.name, error = %e, "rejected list query");
        })?;
        let page = self.engine(ctx.conn()).find_all(&scope, &request).await?;
        debug!(
            resource = self.name,
            total = page.total,
            returned = page.records.len(),
            "list served"
        );
        Ok(page)
    }

    /// # Errors
    /// `NotFound` when the row is absent, deleted or out of scope.
    pub async fn get(
        &self,
        ctx: &ServiceContext,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Record<E::Model>, DomainError> {
        let scope = ctx.scope(caller, self.policy)?;
        Ok(self.engine(ctx.conn()).find_one(&scope, id).await?)
    }

    /// Soft or hard delete, per the resource.
    ///
    /// # Errors
    /// `NotFound` when nothing in scope matched.
    pub async fn delete(
        &self,
        ctx: &ServiceContext,
        caller: &Caller,
        id: Uuid,
    ) -> Result<(), DomainError> {
        let scope = ctx.scope(caller, self.policy)?;
        let engine = self.engine(ctx.conn());
        if self.soft_delete {
            engine.soft_delete(&scope, id).await?;
        } else {
            engine.delete(&scope, id).await?;
        }
        Ok(())
    }
}

/// All seven services over one context.
#[derive(Clone)]
pub struct Services {
    pub projects: Arc<ProjectService>,
    pub brands: Arc<BrandService>,
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub surveys: Arc<SurveyService>,
    pub feedback: Arc<FeedbackService>,
    pub locations: Arc<LocationService>,
}

impl Services {
    #[must_use]
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            projects: Arc::new(ProjectService::new(ctx.clone())),
            brands: Arc::new(BrandService::new(ctx.clone())),
            categories: Arc::new(CategoryService::new(ctx.clone())),
            products: Arc::new(ProductService::new(ctx.clone())),
            surveys: Arc::new(SurveyService::new(ctx.clone())),
            feedback: Arc::new(FeedbackService::new(ctx.clone())),
            locations: Arc::new(LocationService::new(ctx.clone())),
        }
    }
}
