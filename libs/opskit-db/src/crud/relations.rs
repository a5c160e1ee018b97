//! Per-entity relation allowlist.
//!
//! A [`RelationGraph`] is declared once per resource with typed SeaORM
//! columns. Anything not declared here cannot be joined, loaded, filtered or
//! sorted on, so a typo in a relation path surfaces as an error instead of an
//! empty result.
//!
//! ```rust,ignore
//! let graph = RelationGraph::<survey::Entity>::new()
//!     .belongs_to::<project::Entity>("project", survey::Column::ProjectId, project::Column::Id)
//!     .has_many::<feedback::Entity>("feedbacks", survey::Column::Id, feedback::Column::SurveyId)
//!     .nested_belongs_to::<feedback::Entity, user::Entity>(
//!         "feedbacks", "user", feedback::Column::UserId, user::Column::Id,
//!     );
//! ```

use std::collections::BTreeMap;
use std::marker::PhantomData;

use sea_orm::{
    ColumnTrait, DbErr, EntityName, EntityTrait, FromQueryResult, IdenStatic, Iterable,
    QueryResult,
};
use serde::Serialize;
use serde_json::Value;

use crate::crud::error::CrudError;
use crate::crud::kind::FieldKind;
use crate::secure::ScopableEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: &'static str,
    /// `None` for columns that cannot be compared (json, blobs).
    pub kind: Option<FieldKind>,
}

/// Decode the model of a relation from a row, reading columns under a prefix.
pub(crate) type DecodeFn = fn(&QueryResult, &str) -> Result<Option<Value>, DbErr>;

fn decode<T>(row: &QueryResult, prefix: &str) -> Result<Option<Value>, DbErr>
where
    T: EntityTrait,
    T::Model: Serialize,
{
    match T::Model::from_query_result_optional(row, prefix)? {
        Some(model) => serde_json::to_value(&model)
            .map(Some)
            .map_err(|e| DbErr::Json(e.to_string())),
        None => Ok(None),
    }
}

fn columns_of<T: EntityTrait>() -> Vec<ColumnInfo> {
    T::Column::iter()
        .map(|c| ColumnInfo {
            name: c.as_str(),
            kind: FieldKind::of_column(&c),
        })
        .collect()
}

fn table_of<T: EntityTrait>() -> String {
    T::default().table_name().to_owned()
}

/// One declared relation.
#[derive(Clone)]
pub struct RelationNode {
    /// Dot-joined path from the root, also the SQL alias when joined.
    pub path: String,
    /// Key under which the relation appears in a record.
    pub name: String,
    pub parent: Option<String>,
    pub table: String,
    pub cardinality: Cardinality,
    /// Column on the parent side of the join.
    pub parent_col: &'static str,
    /// Column on this relation's side of the join.
    pub child_col: &'static str,
    pub primary_key: &'static str,
    pub deleted_at: Option<&'static str>,
    pub columns: Vec<ColumnInfo>,
    pub(crate) decode: DecodeFn,
}

impl std::fmt::Debug for RelationNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationNode")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("table", &self.table)
            .field("cardinality", &self.cardinality)
            .field("parent_col", &self.parent_col)
            .field("child_col", &self.child_col)
            .field("primary_key", &self.primary_key)
            .field("deleted_at", &self.deleted_at)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl RelationNode {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Prefix under which this relation's columns are selected in the root query.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{}__", self.path)
    }
}

/// Relations a root entity `E` may join or load.
#[derive(Clone, Debug)]
pub struct RelationGraph<E: EntityTrait> {
    table: String,
    primary_key: &'static str,
    deleted_at: Option<&'static str>,
    columns: Vec<ColumnInfo>,
    nodes: BTreeMap<String, RelationNode>,
    errors: Vec<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Default for RelationGraph<E>
where
    E: ScopableEntity,
    E::Column: ColumnTrait + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RelationGraph<E>
where
    E: ScopableEntity,
    E::Column: ColumnTrait + Copy,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: table_of::<E>(),
            primary_key: E::resource_col().as_str(),
            deleted_at: E::deleted_at_col().map(|c| c.as_str()),
            columns: columns_of::<E>(),
            nodes: BTreeMap::new(),
            errors: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// To-one relation joined from the root: `E.from = T.to`.
    #[must_use]
    pub fn belongs_to<T>(self, name: &str, from: E::Column, to: T::Column) -> Self
    where
        T: ScopableEntity,
        T::Column: ColumnTrait + Copy,
        T::Model: Serialize,
    {
        self.add::<T>(None, name, Cardinality::One, from.as_str(), to.as_str())
    }

    /// To-many relation loaded in one batch per page: `E.from = T.to`.
    #[must_use]
    pub fn has_many<T>(self, name: &str, from: E::Column, to: T::Column) -> Self
    where
        T: ScopableEntity,
        T::Column: ColumnTrait + Copy,
        T::Model: Serialize,
    {
        self.add::<T>(None, name, Cardinality::Many, from.as_str(), to.as_str())
    }

    /// To-one relation hanging off an already declared relation `parent` of entity `P`.
    #[must_use]
    pub fn nested_belongs_to<P, T>(
        mut self,
        parent: &str,
        name: &str,
        from: P::Column,
        to: T::Column,
    ) -> Self
    where
        P: EntityTrait,
        P::Column: ColumnTrait + Copy,
        T: ScopableEntity,
        T::Column: ColumnTrait + Copy,
        T::Model: Serialize,
    {
        match self.nodes.get(parent) {
            None => {
                self.errors
                    .push(format!("relation '{parent}.{name}' has undeclared parent"));
                self
            }
            Some(p) if p.table != table_of::<P>() => {
                self.errors.push(format!(
                    "relation '{parent}.{name}': parent is '{}', not '{}'",
                    p.table,
                    table_of::<P>()
                ));
                self
            }
            Some(p) if p.cardinality == Cardinality::Many && p.parent.is_some() => {
                self.errors.push(format!(
                    "relation '{parent}.{name}': only root-level to-many relations may have children"
                ));
                self
            }
            Some(_) => self.add::<T>(
                Some(parent),
                name,
                Cardinality::One,
                from.as_str(),
                to.as_str(),
            ),
        }
    }

    fn add<T>(
        mut self,
        parent: Option<&str>,
        name: &str,
        cardinality: Cardinality,
        parent_col: &'static str,
        child_col: &'static str,
    ) -> Self
    where
        T: ScopableEntity,
        T::Column: ColumnTrait + Copy,
        T::Model: Serialize,
    {
        let path = parent.map_or_else(|| name.to_owned(), |p| format!("{p}.{name}"));
        if name.is_empty() || name.contains('.') {
            self.errors.push(format!("invalid relation name '{name}'"));
            return self;
        }
        if self.nodes.contains_key(&path) {
            self.errors.push(format!("relation '{path}' declared twice"));
            return self;
        }
        let columns = columns_of::<T>();
        if cardinality == Cardinality::Many {
            let parent_kind = self.column(parent_col).and_then(|c| c.kind);
            let child_kind = columns
                .iter()
                .find(|c| c.name == child_col)
                .and_then(|c| c.kind);
            if parent_kind != Some(FieldKind::Uuid) || child_kind != Some(FieldKind::Uuid) {
                self.errors
                    .push(format!("to-many relation '{path}' must join on uuid columns"));
                return self;
            }
        }
        self.nodes.insert(
            path.clone(),
            RelationNode {
                path,
                name: name.to_owned(),
                parent: parent.map(str::to_owned),
                table: table_of::<T>(),
                cardinality,
                parent_col,
                child_col,
                primary_key: T::resource_col().as_str(),
                deleted_at: T::deleted_at_col().map(|c| c.as_str()),
                columns,
                decode: decode::<T>,
            },
        );
        self
    }
}

impl<E: EntityTrait> RelationGraph<E> {
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn primary_key(&self) -> &'static str {
        self.primary_key
    }

    #[must_use]
    pub fn deleted_at(&self) -> Option<&'static str> {
        self.deleted_at
    }

    /// Root column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&RelationNode> {
        self.nodes.get(path)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RelationNode> {
        self.nodes.values()
    }

    /// Children of `parent` (`None` for root-level relations).
    pub fn children<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a RelationNode> + 'a {
        self.nodes
            .values()
            .filter(move |n| n.parent.as_deref() == Some(parent))
    }

    /// True when reaching `path` crosses a to-many relation.
    #[must_use]
    pub fn crosses_many(&self, path: &str) -> bool {
        let mut current = self.nodes.get(path);
        while let Some(node) = current {
            if node.cardinality == Cardinality::Many {
                return true;
            }
            current = node.parent.as_deref().and_then(|p| self.nodes.get(p));
        }
        false
    }

    /// Report declaration mistakes collected while building.
    ///
    /// # Errors
    /// `CrudError::Configuration` listing every mistake.
    pub fn validate(&self) -> Result<(), CrudError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CrudError::configuration(format!(
                "relation graph of '{}': {}",
                self.table,
                self.errors.join("; ")
            )))
        }
    }
}
