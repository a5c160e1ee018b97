//! Field paths → qualified columns, and the predicates built on them.

use opskit_query::{FilterGroup, FilterValue, OrFilterGroups};
use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{Condition, DatabaseBackend, EntityTrait};

use crate::crud::error::CrudError;
use crate::crud::kind::{CoerceError, FieldKind, coerce};
use crate::crud::relations::{Cardinality, RelationGraph, RelationNode};

/// Who named the field: decides between a validation and a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Request,
    Declaration,
}

impl Origin {
    pub(crate) fn error(self, msg: String) -> CrudError {
        match self {
            Self::Request => CrudError::validation(msg),
            Self::Declaration => CrudError::configuration(msg),
        }
    }
}

/// A column qualified with the alias it is reachable under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldRef {
    pub alias: String,
    pub column: &'static str,
    pub kind: Option<FieldKind>,
    /// Relation path that must be joined, `None` for root columns.
    pub relation: Option<String>,
}

impl FieldRef {
    pub(crate) fn expr(&self) -> Expr {
        Expr::col((Alias::new(&self.alias), Alias::new(self.column)))
    }

    fn on(node: &RelationNode, column: &str) -> Option<Self> {
        node.column(column).map(|c| Self {
            alias: node.path.clone(),
            column: c.name,
            kind: c.kind,
            relation: Some(node.path.clone()),
        })
    }
}

pub(crate) struct Resolver<'g, E: EntityTrait> {
    pub graph: &'g RelationGraph<E>,
    /// Name the root may be referred to by, e.g. `product` in `product.name`.
    pub alias: &'g str,
}

impl<E: EntityTrait> Resolver<'_, E> {
    fn root(&self, field: &str, column: &str, origin: Origin) -> Result<FieldRef, CrudError> {
        let c = self
            .graph
            .column(column)
            .ok_or_else(|| origin.error(format!("unknown field '{field}'")))?;
        Ok(FieldRef {
            alias: self.graph.table().to_owned(),
            column: c.name,
            kind: c.kind,
            relation: None,
        })
    }

    /// Resolve `column`, `alias.column` or `relation.path.column`.
    pub(crate) fn field(&self, field: &str, origin: Origin) -> Result<FieldRef, CrudError> {
        let Some((path, column)) = field.rsplit_once('.') else {
            return self.root(field, field, origin);
        };
        if let Some(node) = self.graph.get(path) {
            if self.graph.crosses_many(path) {
                return Err(origin.error(format!(
                    "'{field}' goes through a to-many relation and cannot be filtered, searched or sorted on"
                )));
            }
            return FieldRef::on(node, column)
                .ok_or_else(|| origin.error(format!("unknown field '{field}'")));
        }
        if path == self.alias {
            return self.root(field, column, origin);
        }
        Err(origin.error(format!("unknown field '{field}'")))
    }

    /// Resolve a sort key.
    ///
    /// Dotted keys and root columns resolve directly, so a root column wins
    /// even when a loaded relation has a field of the same name. Any other
    /// unqualified name must match exactly one loaded to-one relation;
    /// several candidates are ambiguous.
    pub(crate) fn sort_field(
        &self,
        field: &str,
        loaded: &[&RelationNode],
    ) -> Result<FieldRef, CrudError> {
        if field.contains('.') || self.graph.column(field).is_some() {
            return self.field(field, Origin::Request);
        }
        let hits: Vec<FieldRef> = loaded
            .iter()
            .filter(|n| n.cardinality == Cardinality::One && !self.graph.crosses_many(&n.path))
            .filter_map(|n| FieldRef::on(n, field))
            .collect();
        match hits.as_slice() {
            [one] => Ok(one.clone()),
            [] => Err(CrudError::validation(format!("unknown sort field '{field}'"))),
            many => Err(CrudError::validation(format!(
                "ambiguous sort field '{field}', qualify it as one of: {}",
                many.iter()
                    .map(|f| format!("{}.{field}", f.alias))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// `field = value`, `field IN (...)` or `field IS NULL`.
pub(crate) fn equality(
    target: &FieldRef,
    field: &str,
    value: &FilterValue,
    origin: Origin,
) -> Result<SimpleExpr, CrudError> {
    let kind = target
        .kind
        .ok_or_else(|| origin.error(format!("field '{field}' cannot be filtered")))?;
    let invalid = |e: CoerceError| origin.error(format!("invalid value for '{field}': {e}"));
    Ok(match value {
        FilterValue::Null => target.expr().is_null(),
        FilterValue::List(items) if items.is_empty() => Expr::value(false),
        FilterValue::List(items) => {
            let values = items
                .iter()
                .map(|v| coerce(kind, v))
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid)?;
            target.expr().is_in(values)
        }
        scalar => target.expr().eq(coerce(kind, scalar).map_err(invalid)?),
    })
}

/// AND of every entry in `group`; each field path is resolved first.
pub(crate) fn group_condition<E: EntityTrait>(
    resolver: &Resolver<'_, E>,
    group: &FilterGroup,
    origin: Origin,
    joins: &mut Vec<String>,
) -> Result<Condition, CrudError> {
    let mut all = Condition::all();
    for (field, value) in group.iter() {
        let target = resolver.field(field, origin)?;
        joins.extend(target.relation.clone());
        all = all.add(equality(&target, field, value, origin)?);
    }
    Ok(all)
}

/// OR of AND groups. No groups means no constraint.
pub(crate) fn or_condition<E: EntityTrait>(
    resolver: &Resolver<'_, E>,
    groups: &OrFilterGroups,
    origin: Origin,
    joins: &mut Vec<String>,
) -> Result<Option<Condition>, CrudError> {
    if groups.is_empty() {
        return Ok(None);
    }
    let mut any = Condition::any();
    for group in groups {
        any = any.add(group_condition(resolver, group, origin, joins)?);
    }
    Ok(Some(any))
}

/// Escape `\`, `%` and `_` for use inside a LIKE pattern with `ESCAPE '\'`.
pub(crate) fn like_escape(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Case-insensitive substring match OR'ed over `fields`.
///
/// The term is folded the way the backend's `LOWER()` folds the column.
/// SQLite only folds ASCII, so non-ASCII letters there match case-sensitively.
pub(crate) fn search_condition(
    fields: &[FieldRef],
    term: &str,
    backend: DatabaseBackend,
) -> Condition {
    let folded = if backend == DatabaseBackend::Sqlite {
        term.to_ascii_lowercase()
    } else {
        term.to_lowercase()
    };
    let pattern = format!("%{}%", like_escape(&folded));
    fields.iter().fold(Condition::any(), |any, f| {
        any.add(
            Expr::expr(Func::lower(f.expr())).like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    })
}
