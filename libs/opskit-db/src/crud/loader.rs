//! Batched loading of to-many relations for one page of root rows.

use std::collections::HashMap;

use sea_orm::sea_query::{Alias, Condition, Expr, JoinType, Order, Query, SelectStatement};
use sea_orm::{ConnectionTrait, DbErr};
use serde_json::Value;
use uuid::Uuid;

use crate::crud::relations::RelationNode;

/// Add `LEFT JOIN <node.table> AS "<node.path>"` against `parent_alias`.
///
/// Soft-deleted rows of the joined table do not match.
pub(crate) fn join_relation(stmt: &mut SelectStatement, parent_alias: &str, node: &RelationNode) {
    let alias = Alias::new(&node.path);
    let mut on = Condition::all().add(
        Expr::col((Alias::new(parent_alias), Alias::new(node.parent_col)))
            .equals((alias.clone(), Alias::new(node.child_col))),
    );
    if let Some(marker) = node.deleted_at {
        on = on.add(Expr::col((alias.clone(), Alias::new(marker))).is_null());
    }
    stmt.join_as(JoinType::LeftJoin, Alias::new(&node.table), alias, on);
}

/// Select every column of `node` as `"<prefix><column>"`.
pub(crate) fn select_relation(stmt: &mut SelectStatement, node: &RelationNode, prefix: &str) {
    for c in &node.columns {
        stmt.expr_as(
            Expr::col((Alias::new(&node.path), Alias::new(c.name))),
            Alias::new(format!("{prefix}{}", c.name)),
        );
    }
}

/// Load `node` rows whose join column is in `keys`, with their nested to-one
/// `children`, grouped by the parent key they belong to.
pub(crate) async fn load_many<C>(
    conn: &C,
    node: &RelationNode,
    children: &[&RelationNode],
    keys: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Value>>, DbErr>
where
    C: ConnectionTrait,
{
    let mut grouped: HashMap<Uuid, Vec<Value>> = HashMap::new();
    if keys.is_empty() {
        return Ok(grouped);
    }

    let alias = Alias::new(&node.path);
    let mut stmt = Query::select();
    stmt.from_as(Alias::new(&node.table), alias.clone());
    select_relation(&mut stmt, node, "");
    for child in children {
        join_relation(&mut stmt, &node.path, child);
        select_relation(&mut stmt, child, &child.prefix());
    }
    stmt.and_where(Expr::col((alias.clone(), Alias::new(node.child_col))).is_in(keys.iter().copied()));
    if let Some(marker) = node.deleted_at {
        stmt.and_where(Expr::col((alias.clone(), Alias::new(marker))).is_null());
    }
    stmt.order_by((alias, Alias::new(node.primary_key)), Order::Asc);

    let backend = conn.get_database_backend();
    let rows = conn.query_all(backend.build(&stmt)).await?;
    tracing::debug!(relation = %node.path, parents = keys.len(), rows = rows.len(), "loaded to-many relation");

    for row in rows {
        let Some(parent) = row.try_get::<Option<Uuid>>("", node.child_col)? else {
            continue;
        };
        let Some(mut value) = (node.decode)(&row, "")? else {
            continue;
        };
        if let Value::Object(obj) = &mut value {
            for child in children {
                let nested = (child.decode)(&row, &child.prefix())?.unwrap_or(Value::Null);
                obj.insert(child.name.clone(), nested);
            }
        }
        grouped.entry(parent).or_default().push(value);
    }
    Ok(grouped)
}
