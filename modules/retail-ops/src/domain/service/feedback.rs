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
use crate::domain::validation::{MAX_TEXT_LEN, optional, rating};
use crate::infra::storage::entity::{feedback, project, survey, user};

pub const POLICY: OwnershipPolicy = OwnershipPolicy::project("project_id");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewFeedback {
    pub survey_id: Uuid,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

pub struct FeedbackService {
    ctx: ServiceContext,
    spec: ResourceSpec<feedback::Entity>,
}

fn spec() -> ResourceSpec<feedback::Entity> {
    let graph = RelationGraph::new()
        .belongs_to::<project::Entity>(
            "project",
            feedback::Column::ProjectId,
            project::Column::Id,
        )
        .belongs_to::<survey::Entity>("survey", feedback::Column::SurveyId, survey::Column::Id)
        .belongs_to::<user::Entity>("user", feedback::Column::UserId, user::Column::Id);
    ResourceSpec {
        relations: &["project", "survey", "user"],
        searchable: &["comment", "survey.title"],
        field_types: FieldTypes::new().integer("rating"),
        ..ResourceSpec::new("feedback", graph, POLICY)
    }
}

impl FeedbackService {
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
    ) -> Result<ListResult<Record<feedback::Model>>, DomainError> {
        self.spec.list(&self.ctx, caller, raw_query).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn get(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Record<feedback::Model>, DomainError> {
        self.spec.get(&self.ctx, caller, id).await
    }

    /// Feedback has no soft-delete marker; the row is removed.
    ///
    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        self.spec.delete(&self.ctx, caller, id).await
    }

    /// Record `caller`'s answer to a survey.
    ///
    /// # Errors
    /// `Validation` for a rating outside 1..=5, an oversized comment, or a
    /// survey the caller cannot see.
    #[instrument(skip(self, caller, new), fields(caller_id = %caller.id))]
    pub async fn create(
        &self,
        caller: &Caller,
        new: NewFeedback,
    ) -> Result<feedback::Model, DomainError> {
        let NewFeedback {
            survey_id,
            rating: score,
            comment,
        } = new;
        let project_id = self.ctx.tenant_project(caller)?;
        let score = rating(score)?;
        let comment = optional("comment", comment.as_deref(), MAX_TEXT_LEN)?;
        self.ctx
            .ensure_visible::<survey::Entity>(
                caller,
                super::survey::POLICY,
                "survey_id",
                survey_id,
            )
            .await?;

        let model = feedback::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            survey_id: Set(survey_id),
            user_id: Set(Some(caller.id)),
            rating: Set(score),
            comment: Set(comment),
            created_at: Set(Utc::now()),
        }
        .insert(self.ctx.conn())
        .await?;
        info!(feedback_id = %model.id, survey_id = %model.survey_id, "feedback recorded");
        Ok(model)
    }
}
