use opskit_query::{FilterGroup, OrFilterGroups};
use uuid::Uuid;

use crate::OwnershipPolicy;

/// Rows a request may touch.
///
/// `Restricted` holds OR'ed groups of equality predicates. A restricted scope
/// with no groups denies everything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessScope {
    Unrestricted,
    Restricted(OrFilterGroups),
}

impl Default for AccessScope {
    fn default() -> Self {
        Self::deny_all()
    }
}

impl AccessScope {
    #[must_use]
    pub fn deny_all() -> Self {
        Self::Restricted(OrFilterGroups::new())
    }

    /// True when no row can match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Restricted(groups) if groups.is_empty())
    }

    /// Scope for a caller inside `project_id`, following `policy`.
    #[must_use]
    pub fn for_member(policy: OwnershipPolicy, project_id: Uuid, caller_id: Uuid) -> Self {
        let groups = match policy {
            OwnershipPolicy::ProjectOnly { project_field } => {
                OrFilterGroups::new().or(FilterGroup::new().with(project_field, project_id))
            }
            OwnershipPolicy::ProjectOrOwner {
                project_field,
                owner_field,
            } => OrFilterGroups::new()
                .or(FilterGroup::new().with(project_field, project_id))
                .or(FilterGroup::new().with(owner_field, caller_id)),
        };
        Self::Restricted(groups)
    }
}
