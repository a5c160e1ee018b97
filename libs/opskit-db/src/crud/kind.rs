//! Logical column kinds and `FilterValue` → `sea_orm::Value` coercion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use opskit_query::FilterValue;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ColumnType};
use uuid::Uuid;

/// Logical types a filter value can be coerced to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I64,
    F64,
    Bool,
    Uuid,
    DateTimeUtc,
    Date,
    Time,
    Decimal,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::String => "String",
            FieldKind::I64 => "I64",
            FieldKind::F64 => "F64",
            FieldKind::Bool => "Bool",
            FieldKind::Uuid => "Uuid",
            FieldKind::DateTimeUtc => "DateTimeUtc",
            FieldKind::Date => "Date",
            FieldKind::Time => "Time",
            FieldKind::Decimal => "Decimal",
        })
    }
}

impl FieldKind {
    /// Kind of a SeaORM column, `None` for types that cannot be filtered (json, blobs, ...).
    #[must_use]
    pub fn of_column<C: ColumnTrait>(col: &C) -> Option<Self> {
        Self::of_type(col.def().get_column_type())
    }

    #[must_use]
    pub fn of_type(ty: &ColumnType) -> Option<Self> {
        Some(match ty {
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => Self::String,
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Self::I64,
            ColumnType::Float | ColumnType::Double => Self::F64,
            ColumnType::Decimal(_) | ColumnType::Money(_) => Self::Decimal,
            ColumnType::Boolean => Self::Bool,
            ColumnType::Uuid => Self::Uuid,
            ColumnType::DateTime | ColumnType::Timestamp | ColumnType::TimestampWithTimeZone => {
                Self::DateTimeUtc
            }
            ColumnType::Date => Self::Date,
            ColumnType::Time => Self::Time,
            _ => return None,
        })
    }
}

/// Why a value could not be coerced. The caller adds the field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoerceError {
    pub expected: FieldKind,
    pub got: String,
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, got {}", self.expected, self.got)
    }
}

fn parse<T: FromStr>(kind: FieldKind, raw: &str) -> Result<T, CoerceError> {
    raw.trim().parse().map_err(|_| CoerceError {
        expected: kind,
        got: format!("'{raw}'"),
    })
}

/// Coerce one scalar. `Null` and `List` are handled by the condition builder.
///
/// # Errors
/// `CoerceError` when the value does not parse as `kind`.
pub fn coerce(kind: FieldKind, v: &FilterValue) -> Result<sea_orm::Value, CoerceError> {
    let mismatch = || CoerceError {
        expected: kind,
        got: v.type_name().to_owned(),
    };
    Ok(match (kind, v) {
        (FieldKind::String, FilterValue::Text(s)) => sea_orm::Value::from(s.clone()),
        (FieldKind::String, FilterValue::Integer(i)) => sea_orm::Value::from(i.to_string()),
        (FieldKind::String, FilterValue::Bool(b)) => sea_orm::Value::from(b.to_string()),

        (FieldKind::I64, FilterValue::Integer(i)) => sea_orm::Value::from(*i),
        (FieldKind::I64, FilterValue::Text(s)) => sea_orm::Value::from(parse::<i64>(kind, s)?),

        (FieldKind::F64, FilterValue::Integer(i)) => {
            sea_orm::Value::from(parse::<f64>(kind, &i.to_string())?)
        }
        (FieldKind::F64, FilterValue::Text(s)) => sea_orm::Value::from(parse::<f64>(kind, s)?),

        (FieldKind::Decimal, FilterValue::Integer(i)) => sea_orm::Value::from(Decimal::from(*i)),
        (FieldKind::Decimal, FilterValue::Text(s)) => {
            sea_orm::Value::from(parse::<Decimal>(kind, s)?)
        }

        (FieldKind::Bool, FilterValue::Bool(b)) => sea_orm::Value::from(*b),
        (FieldKind::Bool, FilterValue::Integer(i @ (0 | 1))) => sea_orm::Value::from(*i == 1),
        (FieldKind::Bool, FilterValue::Text(s)) => sea_orm::Value::from(parse::<bool>(kind, s)?),

        (FieldKind::Uuid, FilterValue::Text(s)) => sea_orm::Value::from(parse::<Uuid>(kind, s)?),

        (FieldKind::DateTimeUtc, FilterValue::Text(s)) => {
            let dt = DateTime::parse_from_rfc3339(s.trim()).map_err(|_| CoerceError {
                expected: kind,
                got: format!("'{s}'"),
            })?;
            sea_orm::Value::from(dt.with_timezone(&Utc))
        }
        (FieldKind::Date, FilterValue::Text(s)) => {
            sea_orm::Value::from(parse::<NaiveDate>(kind, s)?)
        }
        (FieldKind::Time, FilterValue::Text(s)) => {
            sea_orm::Value::from(parse::<NaiveTime>(kind, s)?)
        }

        _ => return Err(mismatch()),
    })
}
