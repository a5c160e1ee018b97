//! Generic listing, lookup and deletion over scoped SeaORM entities.
//!
//! Resources declare a [`RelationGraph`] once and drive everything else
//! through [`CrudEngine`].

pub mod engine;
pub mod error;
pub mod kind;
pub(crate) mod loader;
pub mod record;
pub mod relations;
pub(crate) mod resolve;

pub use engine::CrudEngine;
pub use error::{CrudError, ErrorKind};
pub use kind::FieldKind;
pub use record::Record;
pub use relations::{Cardinality, ColumnInfo, RelationGraph, RelationNode};
