//! Static error definitions shared across crates.

use crate::problem::Problem;
use http::StatusCode;

/// One entry of the error catalog.
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    /// Build a [`Problem`] from this definition.
    #[inline]
    pub fn as_problem(&self, detail: impl Into<String>) -> Problem {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Problem::new(status, self.title, detail.into())
            .with_code(self.code)
            .with_type(self.type_url)
    }
}

/// Malformed pagination, sort or filter input.
pub const VALIDATION: ErrDef = ErrDef {
    status: 422,
    title: "Invalid Query",
    code: "listing.validation",
    type_url: "https://errors.retail-ops.dev/listing/validation",
};

/// The caller has no resolvable scope, or the scope excludes the target.
pub const AUTHORIZATION: ErrDef = ErrDef {
    status: 403,
    title: "Forbidden",
    code: "listing.authorization",
    type_url: "https://errors.retail-ops.dev/listing/authorization",
};

/// Id absent, soft-deleted or outside the caller's scope.
pub const NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    title: "Not Found",
    code: "listing.not_found",
    type_url: "https://errors.retail-ops.dev/listing/not_found",
};

/// A resource declared a relation or field its entity does not have.
pub const CONFIGURATION: ErrDef = ErrDef {
    status: 500,
    title: "Internal Server Error",
    code: "listing.configuration",
    type_url: "https://errors.retail-ops.dev/listing/configuration",
};

/// Store failure passed through unchanged.
pub const DATABASE: ErrDef = ErrDef {
    status: 500,
    title: "Internal Server Error",
    code: "listing.database",
    type_url: "https://errors.retail-ops.dev/listing/database",
};
