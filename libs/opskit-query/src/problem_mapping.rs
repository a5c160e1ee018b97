//! Listing input errors → `Problem` (always 422).

use opskit_errors::{Problem, catalog};

use crate::Error;

impl From<Error> for Problem {
    fn from(err: Error) -> Self {
        let detail = err.to_string();
        let problem = catalog::VALIDATION.as_problem(detail);
        match err {
            Error::InvalidSortOrder(_) => problem.with_violation("sortOrder", "expected ASC or DESC"),
            Error::InvalidValue { field, message } => problem.with_violation(field, message),
            Error::MalformedQuery(_) | Error::InvalidLimits(_) => problem,
        }
    }
}
