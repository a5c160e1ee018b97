//! Normalization of a parsed query tree into a [`ListRequest`].
//!
//! Recognized top-level keys: `search`, `page`, `limit`, `sortBy`,
//! `sortOrder` and the `filters` subtree. Anything else is ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bracket::{FilterNode, QueryTree};
use crate::{Error, FilterGroup, FilterValue, ListLimits, OrFilterGroups};

/// Largest row offset a store accepts; deeper pages read past the end.
pub const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Sort column used when the caller does not name one.
pub const DEFAULT_SORT_FIELD: &str = "created_at";

pub const KEY_SEARCH: &str = "search";
pub const KEY_PAGE: &str = "page";
pub const KEY_LIMIT: &str = "limit";
pub const KEY_SORT_BY: &str = "sortBy";
pub const KEY_SORT_ORDER: &str = "sortOrder";
pub const KEY_FILTERS: &str = "filters";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(Error::InvalidSortOrder(s.to_owned()))
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        })
    }
}

/// Type a resource declares for one of its filterable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Text,
    Integer,
    Bool,
}

/// Per call-site declared types. Undeclared fields stay text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTypes(BTreeMap<String, DeclaredType>);

impl FieldTypes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn declare(mut self, field: impl Into<String>, ty: DeclaredType) -> Self {
        self.0.insert(field.into(), ty);
        self
    }

    #[must_use]
    pub fn integer(self, field: impl Into<String>) -> Self {
        self.declare(field, DeclaredType::Integer)
    }

    #[must_use]
    pub fn boolean(self, field: impl Into<String>) -> Self {
        self.declare(field, DeclaredType::Bool)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> DeclaredType {
        self.0.get(field).copied().unwrap_or(DeclaredType::Text)
    }
}

/// Canonical listing input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub search: Option<String>,
    pub page: u64,
    pub limit: u64,
    /// `None` means the resource's default sort field.
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub equality_filters: FilterGroup,
    pub or_filter_groups: OrFilterGroups,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            limit: ListLimits::default().default_limit,
            sort_by: None,
            sort_order: SortOrder::Desc,
            equality_filters: FilterGroup::new(),
            or_filter_groups: OrFilterGroups::new(),
        }
    }
}

impl ListRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = non_blank(search.into());
        self
    }

    /// Pages below 1 become 1.
    #[must_use]
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    /// Clamped into `[1, 100]`.
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit.clamp(1, ListLimits::default().max_limit);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = non_blank(field.into());
        self.sort_order = order;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.equality_filters.insert(field, value);
        self
    }

    /// Thread caller-supplied OR semantics through. The normalizer never builds these.
    #[must_use]
    pub fn with_or_groups(mut self, groups: OrFilterGroups) -> Self {
        self.or_filter_groups = groups;
        self
    }

    /// Row offset of the first record on this page, capped at [`MAX_OFFSET`].
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(MAX_OFFSET)
    }

    /// Normalize a parsed query tree.
    ///
    /// Missing or non-numeric `page`/`limit` fall back to defaults, out of range
    /// values are clamped. Declared boolean and integer filters are coerced.
    ///
    /// # Errors
    /// - `Error::InvalidSortOrder` when `sortOrder` is not ASC/DESC
    /// - `Error::InvalidValue` for a declared filter that does not parse, or a
    ///   scalar parameter given as a list or object
    pub fn from_tree(
        tree: &QueryTree,
        types: &FieldTypes,
        limits: &ListLimits,
    ) -> Result<Self, Error> {
        let page = number(tree, KEY_PAGE).map_or(1, |p| u64::try_from(p).map_or(1, |p| p.max(1)));
        let limit = number(tree, KEY_LIMIT).map_or(limits.default_limit, |l| limits.clamp_limit(l));

        let search = scalar(tree, KEY_SEARCH)?.and_then(|s| non_blank(s.to_owned()));
        let sort_by = scalar(tree, KEY_SORT_BY)?.and_then(|s| non_blank(s.to_owned()));
        let sort_order = match scalar(tree, KEY_SORT_ORDER)?.map(str::trim) {
            None | Some("") => SortOrder::default(),
            Some(s) => s.parse()?,
        };

        let mut equality_filters = FilterGroup::new();
        match tree.get(KEY_FILTERS) {
            None => {}
            Some(FilterNode::Map(m)) => flatten(m, "", types, &mut equality_filters)?,
            Some(_) => {
                return Err(Error::invalid_value(
                    KEY_FILTERS,
                    "expected bracket form, e.g. filters[name]=value",
                ));
            }
        }

        tracing::trace!(
            page,
            limit,
            filters = equality_filters.len(),
            "normalized list request"
        );

        Ok(Self {
            search,
            page,
            limit,
            sort_by,
            sort_order,
            equality_filters,
            or_filter_groups: OrFilterGroups::new(),
        })
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_owned())
    }
}

/// Lenient numeric read: anything that is not a single integer counts as absent.
fn number(tree: &QueryTree, key: &str) -> Option<i64> {
    tree.get(key)?.as_leaf()?.trim().parse().ok()
}

fn scalar<'t>(tree: &'t QueryTree, key: &str) -> Result<Option<&'t str>, Error> {
    match tree.get(key) {
        None => Ok(None),
        Some(FilterNode::Leaf(s)) => Ok(Some(s)),
        Some(_) => Err(Error::invalid_value(key, "expected a single value")),
    }
}

fn flatten(
    node: &BTreeMap<String, FilterNode>,
    prefix: &str,
    types: &FieldTypes,
    out: &mut FilterGroup,
) -> Result<(), Error> {
    for (name, child) in node {
        if name.contains('.') {
            return Err(Error::invalid_value(
                format!("{KEY_FILTERS}[{name}]"),
                "nest relation fields with brackets instead of dots",
            ));
        }
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match child {
            FilterNode::Map(m) => flatten(m, &path, types, out)?,
            FilterNode::Leaf(raw) => {
                let value = coerce(&path, raw, types.get(&path))?;
                out.insert(path, value);
            }
            FilterNode::List(raws) => {
                let ty = types.get(&path);
                let values = raws
                    .iter()
                    .map(|raw| coerce(&path, raw, ty))
                    .collect::<Result<Vec<_>, _>>()?;
                out.insert(path, FilterValue::List(values));
            }
        }
    }
    Ok(())
}

fn coerce(path: &str, raw: &str, ty: DeclaredType) -> Result<FilterValue, Error> {
    match ty {
        DeclaredType::Text => Ok(FilterValue::Text(raw.to_owned())),
        DeclaredType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(FilterValue::Integer)
            .map_err(|_| Error::invalid_value(path, format!("'{raw}' is not an integer"))),
        DeclaredType::Bool => {
            let v = raw.trim();
            if v.eq_ignore_ascii_case("true") {
                Ok(FilterValue::Bool(true))
            } else if v.eq_ignore_ascii_case("false") {
                Ok(FilterValue::Bool(false))
            } else {
                Err(Error::invalid_value(
                    path,
                    format!("'{raw}' is not true or false"),
                ))
            }
        }
    }
}
