use opskit_db::crud::{CrudError, ErrorKind};
use opskit_db::secure::ScopeError;
use opskit_errors::{Problem, catalog};
use opskit_security::AuthorizationError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Resource-level input check failed on `field`.
    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    /// Malformed listing query (bracket keys, sort order, filter values).
    #[error("Invalid query: {0}")]
    Query(#[from] opskit_query::Error),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Crud(#[from] CrudError),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl DomainError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Same classification the listing engine uses.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::Query(_) => ErrorKind::Validation,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Crud(e) => e.kind(),
            Self::Database(_) => ErrorKind::Database,
        }
    }
}

impl From<ScopeError> for DomainError {
    fn from(e: ScopeError) -> Self {
        Self::Crud(e.into())
    }
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation { field, message } => catalog::VALIDATION
                .as_problem(format!("{field}: {message}"))
                .with_violation(field, message),
            DomainError::Query(e) => e.into(),
            DomainError::Authorization(e) => e.into(),
            DomainError::Crud(e) => e.into(),
            DomainError::Database(e) => {
                tracing::error!(error = %e, "database error");
                catalog::DATABASE.as_problem("An internal error occurred while querying")
            }
        }
    }
}
