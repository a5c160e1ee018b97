use opskit_errors::{Problem, catalog};
use uuid::Uuid;

/// The caller may not see what it asked for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("caller {caller_id} has no project membership")]
    NoProjectMembership { caller_id: Uuid },

    #[error("access denied: {0}")]
    Denied(&'static str),
}

impl From<AuthorizationError> for Problem {
    fn from(err: AuthorizationError) -> Self {
        catalog::AUTHORIZATION.as_problem(err.to_string())
    }
}
