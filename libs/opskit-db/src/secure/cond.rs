use std::str::FromStr;

use opskit_query::FilterValue;
use sea_orm::{ColumnTrait, Condition, EntityName, EntityTrait, sea_query::Expr};

use crate::crud::kind::{FieldKind, coerce};
use crate::secure::error::ScopeError;
use crate::secure::{AccessScope, ScopableEntity};

/// Build the predicate an [`AccessScope`] imposes on `E`.
///
/// # Policy Rules
/// 1. `Unrestricted` → no predicate
/// 2. `Restricted` with no groups → deny all (`false`)
/// 3. otherwise → `(g1) OR (g2) ...`, each group an AND of column equalities
///
/// Columns are qualified with the entity's table so the condition stays
/// unambiguous once joins are added.
///
/// # Errors
/// `ScopeError::UnknownField` when a group names something that is not a
/// column of `E`, `ScopeError::Invalid` when a value does not fit its column.
pub fn build_scope_condition<E>(scope: &AccessScope) -> Result<Condition, ScopeError>
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    let groups = match scope {
        AccessScope::Unrestricted => return Ok(Condition::all()),
        AccessScope::Restricted(groups) if groups.is_empty() => {
            return Ok(Condition::all().add(Expr::value(false)));
        }
        AccessScope::Restricted(groups) => groups,
    };

    let mut any = Condition::any();
    for group in groups {
        let mut all = Condition::all();
        for (field, value) in group.iter() {
            all = all.add(column_predicate::<E>(field, value)?);
        }
        any = any.add(all);
    }
    Ok(any)
}

fn column_predicate<E>(field: &str, value: &FilterValue) -> Result<Condition, ScopeError>
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    let table = E::default();
    let col = E::Column::from_str(field).map_err(|_| ScopeError::UnknownField {
        field: field.to_owned(),
        table: table.table_name().to_owned(),
    })?;
    let kind = FieldKind::of_column(&col)
        .ok_or_else(|| ScopeError::Invalid(format!("scope field '{field}' cannot be compared")))?;
    let target = Expr::col((table, col));

    let expr = match value {
        FilterValue::Null => target.is_null(),
        FilterValue::List(items) => {
            let values = items
                .iter()
                .map(|v| coerce(kind, v))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ScopeError::Invalid(format!("scope field '{field}': {e}")))?;
            target.is_in(values)
        }
        scalar => target.eq(
            coerce(kind, scalar)
                .map_err(|e| ScopeError::Invalid(format!("scope field '{field}': {e}")))?,
        ),
    };
    Ok(Condition::all().add(expr))
}
