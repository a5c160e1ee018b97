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
use crate::domain::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, optional, required};
use crate::infra::storage::entity::{brand, project, user};

/// Brands are visible to their project and, outside it, to their owner.
pub const POLICY: OwnershipPolicy = OwnershipPolicy::project_or_owner("project_id", "owner_id");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewBrand {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

pub struct BrandService {
    ctx: ServiceContext,
    spec: ResourceSpec<brand::Entity>,
}

fn spec() -> ResourceSpec<brand::Entity> {
    let graph = RelationGraph::new()
        .belongs_to::<project::Entity>("project", brand::Column::ProjectId, project::Column::Id)
        .belongs_to::<user::Entity>("owner", brand::Column::OwnerId, user::Column::Id);
    ResourceSpec {
        relations: &["project", "owner"],
        searchable: &["name", "description"],
        field_types: FieldTypes::new().boolean("is_active"),
        soft_delete: true,
        ..ResourceSpec::new("brand", graph, POLICY)
    }
}

impl BrandService {
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
    ) -> Result<ListResult<Record<brand::Model>>, DomainError> {
        self.spec.list(&self.ctx, caller, raw_query).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn get(&self, caller: &Caller, id: Uuid) -> Result<Record<brand::Model>, DomainError> {
        self.spec.get(&self.ctx, caller, id).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        self.spec.delete(&self.ctx, caller, id).await
    }

    /// Create a brand owned by `caller` in the caller's project.
    ///
    /// # Errors
    /// `Validation` for a blank or oversized name or description.
    #[instrument(skip(self, caller, new), fields(caller_id = %caller.id))]
    pub async fn create(&self, caller: &Caller, new: NewBrand) -> Result<brand::Model, DomainError> {
        let NewBrand {
            name,
            description,
            is_active,
        } = new;
        let project_id = self.ctx.tenant_project(caller)?;
        let name = required("name", &name, MAX_NAME_LEN)?;
        let description = optional("description", description.as_deref(), MAX_TEXT_LEN)?;

        let now = Utc::now();
        let model = brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            owner_id: Set(caller.id),
            name: Set(name),
            description: Set(description),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(self.ctx.conn())
        .await?;
        info!(brand_id = %model.id, "brand created");
        Ok(model)
    }
}
