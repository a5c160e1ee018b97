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
use crate::domain::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, required};
use crate::infra::storage::entity::{location, project};

pub const POLICY: OwnershipPolicy = OwnershipPolicy::project("project_id");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    pub city: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

pub struct LocationService {
    ctx: ServiceContext,
    spec: ResourceSpec<location::Entity>,
}

fn spec() -> ResourceSpec<location::Entity> {
    let graph = RelationGraph::new().belongs_to::<project::Entity>(
        "project",
        location::Column::ProjectId,
        project::Column::Id,
    );
    ResourceSpec {
        relations: &["project"],
        searchable: &["name", "city", "address"],
        field_types: FieldTypes::new().boolean("is_active"),
        ..ResourceSpec::new("location", graph, POLICY)
    }
}

impl LocationService {
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
    ) -> Result<ListResult<Record<location::Model>>, DomainError> {
        self.spec.list(&self.ctx, caller, raw_query).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn get(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Record<location::Model>, DomainError> {
        self.spec.get(&self.ctx, caller, id).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        self.spec.delete(&self.ctx, caller, id).await
    }

    /// # Errors
    /// `Validation` for a blank or oversized name, address or city.
    #[instrument(skip(self, caller, new), fields(caller_id = %caller.id))]
    pub async fn create(
        &self,
        caller: &Caller,
        new: NewLocation,
    ) -> Result<location::Model, DomainError> {
        let NewLocation {
            name,
            address,
            city,
            is_active,
        } = new;
        let project_id = self.ctx.tenant_project(caller)?;
        let name = required("name", &name, MAX_NAME_LEN)?;
        let address = required("address", &address, MAX_TEXT_LEN)?;
        let city = required("city", &city, MAX_NAME_LEN)?;

        let now = Utc::now();
        let model = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            name: Set(name),
            address: Set(address),
            city: Set(city),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.ctx.conn())
        .await?;
        info!(location_id = %model.id, "location created");
        Ok(model)
    }
}
