//! Typed filter values and the two-level AND / OR-of-AND structure.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value compared against a column. Text is coerced to the column's own type
/// (uuid, timestamp, number) by the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
    List(Vec<FilterValue>),
}

impl FilterValue {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Field path → value, every entry must hold (AND).
///
/// Paths are dot-joined: `name`, `project.id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterGroup(BTreeMap<String, FilterValue>);

impl FilterGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(field.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterGroup {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Groups OR'ed with each other; each group is AND'ed internally.
///
/// An empty list carries no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrFilterGroups(Vec<FilterGroup>);

impl OrFilterGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn or(mut self, group: FilterGroup) -> Self {
        self.0.push(group);
        self
    }

    pub fn push(&mut self, group: FilterGroup) {
        self.0.push(group);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterGroup> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<FilterGroup>> for OrFilterGroups {
    fn from(groups: Vec<FilterGroup>) -> Self {
        Self(groups)
    }
}

impl<'a> IntoIterator for &'a OrFilterGroups {
    type Item = &'a FilterGroup;
    type IntoIter = std::slice::Iter<'a, FilterGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_the_matching_variant() {
        assert_eq!(FilterValue::from("x"), FilterValue::Text("x".to_owned()));
        assert_eq!(FilterValue::from(7_i64), FilterValue::Integer(7));
        assert_eq!(FilterValue::from(true), FilterValue::Bool(true));
        assert_eq!(FilterValue::from(None::<i64>), FilterValue::Null);
        assert_eq!(
            FilterValue::from(vec![1_i64, 2]),
            FilterValue::List(vec![FilterValue::Integer(1), FilterValue::Integer(2)])
        );
        let id = Uuid::nil();
        assert_eq!(FilterValue::from(id), FilterValue::Text(id.to_string()));
    }

    #[test]
    fn groups_keep_fields_ordered_and_unique() {
        let group = FilterGroup::new()
            .with("project.id", "p1")
            .with("is_active", true)
            .with("project.id", "p2");
        assert_eq!(group.len(), 2);
        assert_eq!(group.get("project.id"), Some(&FilterValue::from("p2")));
        let keys: Vec<_> = group.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["is_active", "project.id"]);
    }

    #[test]
    fn or_groups_serialize_as_list_of_objects() {
        let groups = OrFilterGroups::new()
            .or(FilterGroup::new().with("project_id", "p"))
            .or(FilterGroup::new().with("owner_id", "u"));
        let json = serde_json::to_value(&groups).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "project_id": "p" }, { "owner_id": "u" }])
        );
    }

    #[test]
    fn display_is_readable_in_logs() {
        let v = FilterValue::List(vec![FilterValue::from("a"), FilterValue::Integer(3)]);
        assert_eq!(v.to_string(), "['a', 3]");
    }
}
