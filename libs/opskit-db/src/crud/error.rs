use opskit_errors::{Problem, catalog};

use crate::secure::ScopeError;

/// Coarse classification callers branch on.
///
/// The engine never authorizes; `Authorization` is for layers above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    Configuration,
    Database,
}

/// Failure of a listing engine operation.
#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    /// Bad pagination, sort or filter input. User-correctable.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    /// A resource declared a relation or field its entity does not have.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

impl CrudError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(error = %msg, "listing configuration error");
        Self::Configuration(msg)
    }

    pub(crate) fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Db(_) => ErrorKind::Database,
        }
    }
}

impl From<ScopeError> for CrudError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::Db(e) => Self::Db(e),
            ScopeError::UnknownField { .. } | ScopeError::Invalid(_) => {
                Self::configuration(err.to_string())
            }
        }
    }
}

impl From<CrudError> for Problem {
    fn from(err: CrudError) -> Self {
        match &err {
            CrudError::Validation(msg) => catalog::VALIDATION.as_problem(msg.clone()),
            CrudError::NotFound { .. } => catalog::NOT_FOUND.as_problem(err.to_string()),
            CrudError::Configuration(_) => {
                catalog::CONFIGURATION.as_problem("The listing is misconfigured")
            }
            CrudError::Db(_) => {
                catalog::DATABASE.as_problem("An internal error occurred while querying")
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (CrudError::validation("bad sort"), 422),
            (CrudError::not_found("brand", 7), 404),
            (CrudError::Configuration("no relation 'x'".to_owned()), 500),
            (CrudError::Db(sea_orm::DbErr::Custom("boom".to_owned())), 500),
        ];
        for (err, status) in cases {
            let p: Problem = err.into();
            assert_eq!(p.status, status);
        }
    }

    #[test]
    fn internal_details_are_withheld() {
        let p: Problem = CrudError::Db(sea_orm::DbErr::Custom("password=hunter2".to_owned())).into();
        assert!(!p.detail.contains("hunter2"));
        let p: Problem = CrudError::Configuration("relation 'foo'".to_owned()).into();
        assert!(!p.detail.contains("foo"));
    }

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = CrudError::not_found("product", "abc");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "product 'abc' not found");
    }
}
