//! The listing engine.
//!
//! `CrudEngine` turns a scoped [`ListRequest`] into one paginated statement:
//!
//! ```ignore
//! CrudEngine::new(db.sea(), &graph)
//!     .alias("product")
//!     .relations(&["brand", "category"])
//!     .searchable(&["name", "sku", "brand.name"])
//!     .find_all(&scope, &request)
//!     .await
//! ```
//!
//! # Statement shape
//!
//! - root rows come from a [`SecureSelect`](crate::secure::SecureSelect) scoped
//!   with the caller's [`AccessScope`], soft-deleted rows excluded
//! - to-one relations (requested, or referenced by a filter, search field or
//!   sort key) are LEFT JOINed under their path as alias; requested ones are
//!   also selected as `"<path>__<column>"` and decoded into the record
//! - `COUNT(*) OVER ()` rides along with the page so `total` and `records`
//!   come from the same execution
//! - to-many relations are loaded afterwards, one batched query per relation,
//!   inside the same transaction
//! - ordering always ends with the primary key so pages are deterministic

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use opskit_query::{DEFAULT_SORT_FIELD, ListRequest, ListResult, SortOrder};
use sea_orm::sea_query::{Alias, Expr, Order, SelectStatement};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter, QueryResult,
    QueryTrait, TransactionTrait,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::crud::error::CrudError;
use crate::crud::kind::FieldKind;
use crate::crud::loader::{join_relation, load_many, select_relation};
use crate::crud::record::Record;
use crate::crud::relations::{Cardinality, RelationGraph, RelationNode};
use crate::crud::resolve::{
    FieldRef, Origin, Resolver, group_condition, or_condition, search_condition,
};
use crate::secure::{
    AccessScope, ScopableEntity, SecureDeleteExt, SecureEntityExt, SecureUpdateExt,
};

const TOTAL_COLUMN: &str = "__total";

/// Relations to load for one call, split by how they are fetched.
struct LoadPlan<'g> {
    /// To-one relations joined and decoded from the root row.
    joined: Vec<&'g RelationNode>,
    /// Root-level to-many relations with their requested to-one children.
    many: Vec<(&'g RelationNode, Vec<&'g RelationNode>)>,
}

/// Fluent builder over one entity's listing operations.
#[must_use]
pub struct CrudEngine<'a, E: EntityTrait, C> {
    conn: &'a C,
    graph: &'a RelationGraph<E>,
    alias: String,
    relations: Vec<String>,
    searchable: Vec<String>,
    default_sort: String,
    with_deleted: bool,
}

impl<'a, E, C> CrudEngine<'a, E, C>
where
    E: ScopableEntity,
    E::Column: ColumnTrait + Copy,
    E::Model: Serialize + Send + Sync,
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: &'a C, graph: &'a RelationGraph<E>) -> Self {
        Self {
            conn,
            graph,
            alias: graph.table().to_owned(),
            relations: Vec::new(),
            searchable: Vec::new(),
            default_sort: DEFAULT_SORT_FIELD.to_owned(),
            with_deleted: false,
        }
    }

    /// Name the root answers to in qualified fields and error messages.
    pub fn alias(mut self, alias: &str) -> Self {
        alias.clone_into(&mut self.alias);
        self
    }

    /// Relation paths to eager-load, e.g. `["brand", "feedbacks.user"]`.
    pub fn relations(mut self, paths: &[&str]) -> Self {
        self.relations = paths.iter().map(|p| (*p).to_owned()).collect();
        self
    }

    /// Text fields `search` matches against. Empty makes `search` a no-op.
    pub fn searchable(mut self, fields: &[&str]) -> Self {
        self.searchable = fields.iter().map(|f| (*f).to_owned()).collect();
        self
    }

    pub fn default_sort(mut self, field: &str) -> Self {
        field.clone_into(&mut self.default_sort);
        self
    }

    /// Include soft-deleted rows.
    pub fn with_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }

    fn plan(&self) -> Result<LoadPlan<'a>, CrudError> {
        self.graph.validate()?;
        let graph = self.graph;
        let mut wanted = BTreeSet::new();
        for path in &self.relations {
            let mut current = Some(path.as_str());
            while let Some(p) = current {
                let node = graph.get(p).ok_or_else(|| {
                    CrudError::configuration(format!(
                        "'{}' has no relation '{p}' (requested '{path}')",
                        self.alias
                    ))
                })?;
                wanted.insert(node.path.as_str());
                current = node.parent.as_deref();
            }
        }

        let mut plan = LoadPlan {
            joined: Vec::new(),
            many: Vec::new(),
        };
        for path in &wanted {
            let Some(node) = graph.get(path) else {
                continue;
            };
            if node.cardinality == Cardinality::Many {
                let children = graph
                    .children(&node.path)
                    .filter(|c| wanted.contains(c.path.as_str()))
                    .collect();
                plan.many.push((node, children));
            } else if !graph.crosses_many(path) {
                plan.joined.push(node);
            }
        }
        Ok(plan)
    }

    /// Scoped root select with joins for `plan` and for every referenced path.
    fn base_select(
        &self,
        scope: &AccessScope,
        plan: &LoadPlan<'_>,
        referenced: &[String],
    ) -> Result<SelectStatement, CrudError> {
        let mut secure = E::find().secure().scope_with(scope)?;
        if !self.with_deleted {
            secure = secure.exclude_deleted();
        }
        let mut stmt = secure.into_inner().into_query();

        let mut joined = BTreeSet::new();
        let mut paths: BTreeSet<&str> = plan.joined.iter().map(|n| n.path.as_str()).collect();
        paths.extend(referenced.iter().map(String::as_str));
        for path in paths {
            self.join_path(&mut stmt, &mut joined, path)?;
        }
        for node in &plan.joined {
            select_relation(&mut stmt, node, &node.prefix());
        }
        Ok(stmt)
    }

    fn join_path(
        &self,
        stmt: &mut SelectStatement,
        joined: &mut BTreeSet<String>,
        path: &str,
    ) -> Result<(), CrudError> {
        if joined.contains(path) {
            return Ok(());
        }
        let node = self
            .graph
            .get(path)
            .ok_or_else(|| CrudError::configuration(format!("unknown relation '{path}'")))?;
        let parent_alias = match &node.parent {
            Some(parent) => {
                self.join_path(stmt, joined, parent)?;
                parent.as_str()
            }
            None => self.graph.table(),
        };
        join_relation(stmt, parent_alias, node);
        joined.insert(path.to_owned());
        Ok(())
    }

    fn searchable_fields(&self) -> Result<Vec<FieldRef>, CrudError> {
        let resolver = self.resolver();
        self.searchable
            .iter()
            .map(|f| {
                let target = resolver.field(f, Origin::Declaration)?;
                if target.kind == Some(FieldKind::String) {
                    Ok(target)
                } else {
                    Err(CrudError::configuration(format!(
                        "searchable field '{f}' of '{}' is not text",
                        self.alias
                    )))
                }
            })
            .collect()
    }

    fn resolver(&self) -> Resolver<'_, E> {
        Resolver {
            graph: self.graph,
            alias: &self.alias,
        }
    }

    /// Where clause, sort target and the relation paths they need.
    fn compile(
        &self,
        request: &ListRequest,
        plan: &LoadPlan<'_>,
    ) -> Result<(Vec<sea_orm::Condition>, FieldRef, Vec<String>), CrudError> {
        let resolver = self.resolver();
        let mut referenced = Vec::new();
        let mut conditions = Vec::new();

        if !request.equality_filters.is_empty() {
            conditions.push(group_condition(
                &resolver,
                &request.equality_filters,
                Origin::Request,
                &mut referenced,
            )?);
        }
        if let Some(any) = or_condition(
            &resolver,
            &request.or_filter_groups,
            Origin::Request,
            &mut referenced,
        )? {
            conditions.push(any);
        }

        let fields = self.searchable_fields()?;
        match request.search.as_deref() {
            Some(term) if !fields.is_empty() => {
                referenced.extend(fields.iter().filter_map(|f| f.relation.clone()));
                conditions.push(search_condition(
                    &fields,
                    term,
                    self.conn.get_database_backend(),
                ));
            }
            Some(_) => debug!(entity = %self.alias, "search has no effect for this resource"),
            None => {}
        }

        let sort = match request.sort_by.as_deref() {
            Some(field) => resolver.sort_field(field, &plan.joined)?,
            None => resolver.field(&self.default_sort, Origin::Declaration)?,
        };
        referenced.extend(sort.relation.clone());
        Ok((conditions, sort, referenced))
    }

    fn order(&self, stmt: &mut SelectStatement, sort: &FieldRef, dir: SortOrder) {
        let order = match dir {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        stmt.order_by(
            (Alias::new(&sort.alias), Alias::new(sort.column)),
            order.clone(),
        );
        let pk = self.graph.primary_key();
        if sort.relation.is_some() || sort.column != pk {
            stmt.order_by((Alias::new(self.graph.table()), Alias::new(pk)), order);
        }
    }

    /// Decode root rows and their joined to-one relations; collect to-many keys.
    fn decode_rows(
        plan: &LoadPlan<'_>,
        rows: &[QueryResult],
    ) -> Result<(Vec<Record<E::Model>>, Vec<Vec<Option<Uuid>>>), CrudError> {
        let mut records = Vec::with_capacity(rows.len());
        let mut keys = vec![Vec::with_capacity(rows.len()); plan.many.len()];
        for row in rows {
            let mut record = Record::new(E::Model::from_query_result(row, "")?);
            for node in &plan.joined {
                let value = (node.decode)(row, &node.prefix())?.unwrap_or(Value::Null);
                let segments: Vec<&str> = node.path.split('.').collect();
                insert_at(&mut record.relations, &segments, value);
            }
            for (slot, (node, _)) in keys.iter_mut().zip(&plan.many) {
                slot.push(row.try_get::<Option<Uuid>>("", node.parent_col)?);
            }
            records.push(record);
        }
        Ok((records, keys))
    }

    async fn attach_many<Cn: ConnectionTrait>(
        conn: &Cn,
        plan: &LoadPlan<'_>,
        records: &mut [Record<E::Model>],
        keys: &[Vec<Option<Uuid>>],
    ) -> Result<(), CrudError> {
        for ((node, children), node_keys) in plan.many.iter().zip(keys) {
            let distinct: Vec<Uuid> = node_keys
                .iter()
                .flatten()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let mut grouped: HashMap<Uuid, Vec<Value>> =
                load_many(conn, node, children, &distinct).await?;
            for (record, key) in records.iter_mut().zip(node_keys) {
                let items = key
                    .and_then(|k| grouped.get(&k).cloned())
                    .unwrap_or_default();
                record.relations.insert(node.name.clone(), Value::Array(items));
            }
            grouped.clear();
        }
        Ok(())
    }

    /// Scoped, searched, filtered, sorted page plus the total match count.
    ///
    /// # Errors
    /// - `Validation` for unknown or ambiguous filter/sort fields and bad values
    /// - `Configuration` for undeclared relations or searchable fields
    /// - `Db` for store failures
    #[instrument(skip_all, fields(entity = %self.alias, page = request.page, limit = request.limit))]
    pub async fn find_all(
        &self,
        scope: &AccessScope,
        request: &ListRequest,
    ) -> Result<ListResult<Record<E::Model>>, CrudError> {
        let plan = self.plan()?;
        let (conditions, sort, referenced) = self.compile(request, &plan)?;
        let mut stmt = self.base_select(scope, &plan, &referenced)?;
        for cond in conditions {
            stmt.cond_where(cond);
        }

        let mut count_stmt = stmt.clone();
        count_stmt
            .clear_selects()
            .expr_as(Expr::cust("COUNT(*)"), Alias::new(TOTAL_COLUMN));

        stmt.expr_as(Expr::cust("COUNT(*) OVER ()"), Alias::new(TOTAL_COLUMN));
        self.order(&mut stmt, &sort, request.sort_order);
        stmt.limit(request.limit).offset(request.offset());

        let backend = self.conn.get_database_backend();
        let txn = self.conn.begin().await?;
        let rows = txn.query_all(backend.build(&stmt)).await?;
        let total = match rows.first() {
            Some(row) => row.try_get::<i64>("", TOTAL_COLUMN)?,
            None if request.page > 1 => match txn.query_one(backend.build(&count_stmt)).await? {
                Some(row) => row.try_get::<i64>("", TOTAL_COLUMN)?,
                None => 0,
            },
            None => 0,
        };

        let (mut records, keys) = Self::decode_rows(&plan, &rows)?;
        Self::attach_many(&txn, &plan, &mut records, &keys).await?;
        txn.commit().await?;

        debug!(total, returned = records.len(), "listed");
        Ok(ListResult::new(
            u64::try_from(total).unwrap_or_default(),
            request.page,
            request.limit,
            records,
        ))
    }

    /// One scoped row by primary key, with the configured relations.
    ///
    /// # Errors
    /// `NotFound` when the id is absent, soft-deleted or outside `scope`.
    #[instrument(skip_all, fields(entity = %self.alias, %id))]
    pub async fn find_one(
        &self,
        scope: &AccessScope,
        id: Uuid,
    ) -> Result<Record<E::Model>, CrudError> {
        let plan = self.plan()?;
        let mut stmt = self.base_select(scope, &plan, &[])?;
        let pk = Expr::col((
            Alias::new(self.graph.table()),
            Alias::new(self.graph.primary_key()),
        ));
        stmt.and_where(pk.eq(id)).limit(1);

        let backend = self.conn.get_database_backend();
        let rows = self.conn.query_all(backend.build(&stmt)).await?;
        let (mut records, keys) = Self::decode_rows(&plan, &rows)?;
        Self::attach_many(self.conn, &plan, &mut records, &keys).await?;
        records
            .pop()
            .ok_or_else(|| CrudError::not_found(self.alias.as_str(), id))
    }

    /// Remove the row.
    ///
    /// # Errors
    /// `NotFound` when nothing in scope matched `id`.
    #[instrument(skip_all, fields(entity = %self.alias, %id))]
    pub async fn delete(&self, scope: &AccessScope, id: Uuid) -> Result<(), CrudError> {
        let mut stmt =
            E::delete_many().filter(Expr::col((E::default(), E::resource_col())).eq(id));
        if !self.with_deleted
            && let Some(marker) = E::deleted_at_col()
        {
            stmt = stmt.filter(Expr::col((E::default(), marker)).is_null());
        }
        let res = stmt.secure().scope_with(scope)?.exec(self.conn).await?;
        if res.rows_affected == 0 {
            return Err(CrudError::not_found(self.alias.as_str(), id));
        }
        info!("deleted");
        Ok(())
    }

    /// Stamp the deletion marker instead of removing the row.
    ///
    /// # Errors
    /// `NotFound` when nothing in scope matched `id` (including rows already
    /// soft-deleted), `Configuration` when the entity has no marker column.
    #[instrument(skip_all, fields(entity = %self.alias, %id))]
    pub async fn soft_delete(&self, scope: &AccessScope, id: Uuid) -> Result<(), CrudError> {
        let Some(marker) = E::deleted_at_col() else {
            return Err(CrudError::configuration(format!(
                "'{}' has no soft-delete marker",
                self.alias
            )));
        };
        let res = E::update_many()
            .col_expr(marker, Expr::value(Utc::now()))
            .filter(Expr::col((E::default(), E::resource_col())).eq(id))
            .filter(Expr::col((E::default(), marker)).is_null())
            .secure()
            .scope_with(scope)?
            .exec(self.conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(CrudError::not_found(self.alias.as_str(), id));
        }
        info!("soft-deleted");
        Ok(())
    }
}

/// Place `value` at `segments` inside nested relation objects.
/// Nothing is written below a parent that is `null`.
fn insert_at(map: &mut serde_json::Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_owned(), value);
        }
        [first, rest @ ..] => {
            if let Some(Value::Object(inner)) = map.get_mut(*first) {
                insert_at(inner, rest, value);
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_at_nests_under_existing_objects_only() {
        let mut map = serde_json::Map::new();
        insert_at(&mut map, &["brand"], json!({ "name": "Acme" }));
        insert_at(&mut map, &["brand", "project"], json!({ "name": "P" }));
        insert_at(&mut map, &["category"], Value::Null);
        insert_at(&mut map, &["category", "parent"], json!({ "name": "x" }));
        assert_eq!(
            Value::Object(map),
            json!({
                "brand": { "name": "Acme", "project": { "name": "P" } },
                "category": null
            })
        );
    }
}
