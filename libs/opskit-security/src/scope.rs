//! Caller → tenant scope.
//!
//! Super-admin detection happens here and nowhere else: resources receive a
//! [`ScopeContext`] and turn it into an [`AccessScope`] with their own
//! [`OwnershipPolicy`].

use std::collections::BTreeSet;

use tracing::debug;
use uuid::Uuid;

use crate::{AccessScope, AuthorizationError, Caller, OwnershipPolicy};

pub const DEFAULT_SUPER_ADMIN_ROLE: &str = "super_admin";

/// Request-scoped result of resolving a caller.
///
/// A non-super-admin context always carries a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeContext {
    caller_id: Uuid,
    is_super_admin: bool,
    tenant_project_id: Option<Uuid>,
}

impl ScopeContext {
    #[must_use]
    pub fn super_admin(caller_id: Uuid, project_id: Option<Uuid>) -> Self {
        Self {
            caller_id,
            is_super_admin: true,
            tenant_project_id: project_id,
        }
    }

    #[must_use]
    pub fn member(caller_id: Uuid, project_id: Uuid) -> Self {
        Self {
            caller_id,
            is_super_admin: false,
            tenant_project_id: Some(project_id),
        }
    }

    #[must_use]
    pub fn caller_id(&self) -> Uuid {
        self.caller_id
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.is_super_admin
    }

    #[must_use]
    pub fn tenant_project_id(&self) -> Option<Uuid> {
        self.tenant_project_id
    }

    /// Rows this caller may touch on a resource governed by `policy`.
    #[must_use]
    pub fn access_scope(&self, policy: OwnershipPolicy) -> AccessScope {
        match (self.is_super_admin, self.tenant_project_id) {
            (true, _) => AccessScope::Unrestricted,
            (false, Some(project_id)) => AccessScope::for_member(policy, project_id, self.caller_id),
            (false, None) => AccessScope::deny_all(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScopeResolver {
    super_admin_roles: BTreeSet<String>,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new([DEFAULT_SUPER_ADMIN_ROLE])
    }
}

impl ScopeResolver {
    #[must_use]
    pub fn new<I, S>(super_admin_roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            super_admin_roles: super_admin_roles.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_super_admin(&self, caller: &Caller) -> bool {
        self.super_admin_roles.contains(caller.role.name.trim())
    }

    /// # Errors
    /// `AuthorizationError::NoProjectMembership` when the caller is not a
    /// super-admin and has no project.
    pub fn resolve(&self, caller: &Caller) -> Result<ScopeContext, AuthorizationError> {
        let project_id = caller.project_id();
        if self.is_super_admin(caller) {
            debug!(caller_id = %caller.id, "super-admin caller, scope bypassed");
            return Ok(ScopeContext::super_admin(caller.id, project_id));
        }
        let project_id = project_id.ok_or(AuthorizationError::NoProjectMembership {
            caller_id: caller.id,
        })?;
        debug!(caller_id = %caller.id, %project_id, "caller scoped to project");
        Ok(ScopeContext::member(caller.id, project_id))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn super_admin_bypasses_scope() {
        let caller = Caller::new(Uuid::new_v4(), "super_admin");
        let ctx = ScopeResolver::default().resolve(&caller).unwrap();
        assert!(ctx.is_super_admin());
        assert_eq!(ctx.tenant_project_id(), None);
        assert_eq!(
            ctx.access_scope(OwnershipPolicy::project("project_id")),
            AccessScope::Unrestricted
        );
    }

    #[test]
    fn member_is_bound_to_project() {
        let pid = Uuid::new_v4();
        let caller = Caller::new(Uuid::new_v4(), "manager").with_project(pid);
        let ctx = ScopeResolver::default().resolve(&caller).unwrap();
        assert!(!ctx.is_super_admin());
        assert_eq!(ctx.tenant_project_id(), Some(pid));
        assert!(!ctx.access_scope(OwnershipPolicy::project("project_id")).is_empty());
    }

    #[test]
    fn member_without_project_is_rejected() {
        let caller = Caller::new(Uuid::new_v4(), "manager");
        let err = ScopeResolver::default().resolve(&caller).unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::NoProjectMembership {
                caller_id: caller.id
            }
        );
    }

    #[test]
    fn super_admin_roles_are_configurable() {
        let resolver = ScopeResolver::new(["root", "ops_admin"]);
        assert!(resolver.is_super_admin(&Caller::new(Uuid::nil(), "ops_admin")));
        assert!(!resolver.is_super_admin(&Caller::new(Uuid::nil(), "super_admin")));
    }
}
