use chrono::Utc;
use opskit_db::crud::{Record, RelationGraph};
use opskit_query::{FieldTypes, ListResult};
use opskit_security::{AuthorizationError, Caller, OwnershipPolicy};
use sea_orm::{ActiveModelTrait, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{ResourceSpec, ServiceContext, default_true};
use crate::domain::error::DomainError;
use crate::domain::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, optional, required};
use crate::infra::storage::entity::project;

/// A member sees exactly the project it belongs to.
pub const POLICY: OwnershipPolicy = OwnershipPolicy::project("id");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

pub struct ProjectService {
    ctx: ServiceContext,
    spec: ResourceSpec<project::Entity>,
}

fn spec() -> ResourceSpec<project::Entity> {
    ResourceSpec {
        searchable: &["name"],
        field_types: FieldTypes::new().boolean("is_active"),
        soft_delete: true,
        ..ResourceSpec::new("project", RelationGraph::new(), POLICY)
    }
}

impl ProjectService {
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx, spec: spec() }
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn list(
        &self,
        caller: &Caller,
        raw_query: &str,
    ) -> Result<ListResult<Record<project::Model>>, DomainError> {
        self.spec.list(&self.ctx, caller, raw_query).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn get(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Record<project::Model>, DomainError> {
        self.spec.get(&self.ctx, caller, id).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        self.spec.delete(&self.ctx, caller, id).await
    }

    /// Only super-admins open new projects.
    ///
    /// # Errors
    /// `Authorization` for other callers, `Validation` for a blank name.
    #[instrument(skip(self, caller, new), fields(caller_id = %caller.id))]
    pub async fn create(
        &self,
        caller: &Caller,
        new: NewProject,
    ) -> Result<project::Model, DomainError> {
        if !self.ctx.is_super_admin(caller) {
            return Err(AuthorizationError::Denied("only super-admins may create projects").into());
        }
        let NewProject {
            name,
            description,
            is_active,
        } = new;
        let name = required("name", &name, MAX_NAME_LEN)?;
        let description = optional("description", description.as_deref(), MAX_TEXT_LEN)?;

        let now = Utc::now();
        let model = project::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(description),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(self.ctx.conn())
        .await?;
        info!(project_id = %model.id, "project created");
        Ok(model)
    }
}
