use chrono::Utc;
use opskit_db::crud::{Record, RelationGraph};
use opskit_query::{FieldTypes, ListResult};
use opskit_security::{Caller, OwnershipPolicy};
use sea_orm::{ActiveModelTrait, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{ResourceSpec, ServiceContext};
use crate::domain::error::DomainError;
use crate::domain::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, optional, required};
use crate::infra::storage::entity::{feedback, project, survey, user};

pub const POLICY: OwnershipPolicy = OwnershipPolicy::project("project_id");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSurvey {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

pub struct SurveyService {
    ctx: ServiceContext,
    spec: ResourceSpec<survey::Entity>,
}

/// Surveys load their feedback, and each feedback its author.
fn spec() -> ResourceSpec<survey::Entity> {
    let graph = RelationGraph::new()
        .belongs_to::<project::Entity>("project", survey::Column::ProjectId, project::Column::Id)
        .has_many::<feedback::Entity>("feedbacks", survey::Column::Id, feedback::Column::SurveyId)
        .nested_belongs_to::<feedback::Entity, user::Entity>(
            "feedbacks",
            "user",
            feedback::Column::UserId,
            user::Column::Id,
        );
    ResourceSpec {
        relations: &["project", "feedbacks", "feedbacks.user"],
        searchable: &["title"],
        field_types: FieldTypes::new().boolean("is_published"),
        soft_delete: true,
        ..ResourceSpec::new("survey", graph, POLICY)
    }
}

impl SurveyService {
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
    ) -> Result<ListResult<Record<survey::Model>>, DomainError> {
        self.spec.list(&self.ctx, caller, raw_query).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn get(&self, caller: &Caller, id: Uuid) -> Result<Record<survey::Model>, DomainError> {
        self.spec.get(&self.ctx, caller, id).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        self.spec.delete(&self.ctx, caller, id).await
    }

    /// # Errors
    /// `Validation` for a blank title or oversized description.
    #[instrument(skip(self, caller, new), fields(caller_id = %caller.id))]
    pub async fn create(&self, caller: &Caller, new: NewSurvey) -> Result<survey::Model, DomainError> {
        let NewSurvey {
            title,
            description,
            is_published,
        } = new;
        let project_id = self.ctx.tenant_project(caller)?;
        let title = required("title", &title, MAX_NAME_LEN)?;
        let description = optional("description", description.as_deref(), MAX_TEXT_LEN)?;

        let now = Utc::now();
        let model = survey::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            title: Set(title),
            description: Set(description),
            is_published: Set(is_published),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(self.ctx.conn())
        .await?;
        info!(survey_id = %model.id, "survey created");
        Ok(model)
    }
}
