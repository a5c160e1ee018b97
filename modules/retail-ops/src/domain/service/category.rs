use chrono::Utc;
use opskit_db::crud::{Record, RelationGraph};
use opskit_query::{FieldTypes, ListResult};
use opskit_security::{Caller, OwnershipPolicy};
use sea_orm::{ActiveModelTrait, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{ResourceSpec, ServiceContext, default_true};
use crate::domain::error::DomainError;
use crate::domain::validation::{MAX_NAME_LEN, required};
use crate::infra::storage::entity::{category, project, user};

/// Same owner fallback as brands.
pub const POLICY: OwnershipPolicy = OwnershipPolicy::project_or_owner("project_id", "owner_id");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

pub struct CategoryService {
    ctx: ServiceContext,
    spec: ResourceSpec<category::Entity>,
}

fn spec() -> ResourceSpec<category::Entity> {
    let graph = RelationGraph::new()
        .belongs_to::<project::Entity>(
            "project",
            category::Column::ProjectId,
            project::Column::Id,
        )
        .belongs_to::<user::Entity>("owner", category::Column::OwnerId, user::Column::Id)
        .belongs_to::<category::Entity>(
            "parent",
            category::Column::ParentId,
            category::Column::Id,
        );
    ResourceSpec {
        relations: &["project", "owner", "parent"],
        searchable: &["name"],
        field_types: FieldTypes::new().boolean("is_active"),
        soft_delete: true,
        ..ResourceSpec::new("category", graph, POLICY)
    }
}

impl CategoryService {
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
    ) -> Result<ListResult<Record<category::Model>>, DomainError> {
        self.spec.list(&self.ctx, caller, raw_query).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn get(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Record<category::Model>, DomainError> {
        self.spec.get(&self.ctx, caller, id).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        self.spec.delete(&self.ctx, caller, id).await
    }

    /// # Errors
    /// `Validation` for a blank name or a parent the caller cannot see.
    #[instrument(skip(self, caller, new), fields(caller_id = %caller.id))]
    pub async fn create(
        &self,
        caller: &Caller,
        new: NewCategory,
    ) -> Result<category::Model, DomainError> {
        let NewCategory {
            name,
            parent_id,
            is_active,
        } = new;
        let project_id = self.ctx.tenant_project(caller)?;
        let name = required("name", &name, MAX_NAME_LEN)?;
        if let Some(parent) = parent_id {
            self.ctx
                .ensure_visible::<category::Entity>(caller, POLICY, "parent_id", parent)
                .await?;
        }

        let now = Utc::now();
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            owner_id: Set(caller.id),
            parent_id: Set(parent_id),
            name: Set(name),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(self.ctx.conn())
        .await?;
        info!(category_id = %model.id, "category created");
        Ok(model)
    }
}
