#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Listing input for the back office.
//!
//! Raw query strings flow through two stages before they reach the database:
//!
//! 1. [`bracket`] turns flat keys such as `filters[role][name]` into a
//!    [`FilterNode`] tree.
//! 2. [`request`] normalizes that tree into a [`ListRequest`]: pagination
//!    defaults and clamping, sort parsing, and typed equality filters.
//!
//! Results come back as [`ListResult`].

pub mod bracket;
pub mod errors;
pub mod filter;
pub mod limits;
pub mod page;
pub mod problem_mapping;
pub mod request;

pub use bracket::{FilterNode, QueryTree, parse_pairs, parse_query_string};
pub use errors::Error;
pub use filter::{FilterGroup, FilterValue, OrFilterGroups};
pub use limits::ListLimits;
pub use page::ListResult;
pub use request::{DEFAULT_SORT_FIELD, DeclaredType, FieldTypes, ListRequest, MAX_OFFSET, SortOrder};
