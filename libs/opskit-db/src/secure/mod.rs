//! Scoped database access.
//!
//! Queries are wrapped in typestate builders that cannot execute until an
//! [`AccessScope`] has been applied:
//!
//! ```rust,ignore
//! use opskit_db::secure::SecureEntityExt;
//!
//! let brands = brand::Entity::find()
//!     .secure()
//!     .scope_with(&scope)?
//!     .all(conn)
//!     .await?;
//! ```
//!
//! An empty restricted scope denies everything. `AccessScope::Unrestricted`
//! adds no predicate and is only produced for super-admin callers.

mod cond;
mod db_ops;
mod entity_traits;
mod error;
mod select;

pub use cond::build_scope_condition;
pub use db_ops::{SecureDeleteExt, SecureDeleteMany, SecureUpdateExt, SecureUpdateMany};
pub use entity_traits::ScopableEntity;
pub use error::ScopeError;
pub use opskit_security::AccessScope;
pub use select::{Scoped, SecureEntityExt, SecureSelect, Unscoped};
