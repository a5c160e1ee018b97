/// How a resource's rows are attributed to callers.
///
/// Field names are the resource's own filter paths; nothing here knows
/// about particular tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnershipPolicy {
    /// Visible only inside the caller's project.
    ProjectOnly { project_field: &'static str },
    /// Visible inside the caller's project, or anywhere when the caller owns the row.
    ProjectOrOwner {
        project_field: &'static str,
        owner_field: &'static str,
    },
}

impl OwnershipPolicy {
    #[must_use]
    pub const fn project(project_field: &'static str) -> Self {
        Self::ProjectOnly { project_field }
    }

    #[must_use]
    pub const fn project_or_owner(project_field: &'static str, owner_field: &'static str) -> Self {
        Self::ProjectOrOwner {
            project_field,
            owner_field,
        }
    }

    #[must_use]
    pub const fn project_field(&self) -> &'static str {
        match self {
            Self::ProjectOnly { project_field } | Self::ProjectOrOwner { project_field, .. } => {
                project_field
            }
        }
    }
}
