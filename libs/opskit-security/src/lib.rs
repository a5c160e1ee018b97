#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod access_scope;
pub mod caller;
pub mod error;
pub mod policy;
pub mod scope;

pub use access_scope::AccessScope;
pub use caller::{Caller, ProjectRef, Role};
pub use error::AuthorizationError;
pub use policy::OwnershipPolicy;
pub use scope::{DEFAULT_SUPER_ADMIN_ROLE, ScopeContext, ScopeResolver};
