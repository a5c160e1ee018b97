use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller as handed over by the HTTP layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: Uuid,
}

impl Caller {
    #[must_use]
    pub fn new(id: Uuid, role: impl Into<String>) -> Self {
        Self {
            id,
            role: Role { name: role.into() },
            project: None,
            project_id: None,
        }
    }

    #[must_use]
    pub fn with_project(mut self, project_id: Uuid) -> Self {
        self.project = Some(ProjectRef { id: project_id });
        self
    }

    /// The caller's project: the loaded `project` relation wins over the raw `project_id`.
    #[must_use]
    pub fn project_id(&self) -> Option<Uuid> {
        self.project.map(|p| p.id).or(self.project_id)
    }
}
