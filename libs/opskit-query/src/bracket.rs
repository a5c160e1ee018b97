//! Bracket-notation query keys → nested tree.
//!
//! `filters[role][name]=admin` becomes `{ filters: { role: { name: "admin" } } }`.
//! Keys without brackets stay top-level scalars. Repeated keys and the `[]`
//! suffix collect values into a list. Only bracket form nests: a key such as
//! `filters.role` is kept verbatim as a single name.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::{Error, ListLimits};

/// One node of a parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    Leaf(String),
    List(Vec<String>),
    Map(BTreeMap<String, FilterNode>),
}

/// Top level of a parsed query string.
pub type QueryTree = BTreeMap<String, FilterNode>;

impl FilterNode {
    #[must_use]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, FilterNode>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "scalar",
            Self::List(_) => "list",
            Self::Map(_) => "object",
        }
    }
}

/// Parsed form of one raw key.
struct KeyPath<'k> {
    segments: Vec<&'k str>,
    append: bool,
}

fn split_key(key: &str) -> Result<KeyPath<'_>, Error> {
    let Some(open) = key.find('[') else {
        return Ok(KeyPath {
            segments: vec![key],
            append: false,
        });
    };

    let head = &key[..open];
    if head.is_empty() {
        return Err(Error::malformed(format!("key '{key}' has no name")));
    }

    let mut segments = vec![head];
    let mut append = false;
    let mut rest = &key[open..];
    while !rest.is_empty() {
        if append {
            return Err(Error::malformed(format!(
                "key '{key}': '[]' must be the last segment"
            )));
        }
        let Some(inner) = rest.strip_prefix('[') else {
            return Err(Error::malformed(format!(
                "key '{key}': unexpected text after ']'"
            )));
        };
        let Some(close) = inner.find(']') else {
            return Err(Error::malformed(format!("key '{key}': unterminated '['")));
        };
        let segment = &inner[..close];
        if segment.contains('[') {
            return Err(Error::malformed(format!("key '{key}': nested '[' in segment")));
        }
        if segment.is_empty() {
            append = true;
        } else {
            segments.push(segment);
        }
        rest = &inner[close + 1..];
    }

    Ok(KeyPath { segments, append })
}

fn collision(key: &str, existing: &FilterNode, wanted: &str) -> Error {
    Error::malformed(format!(
        "key '{key}' is used both as {} and as {wanted}",
        existing.kind()
    ))
}

fn insert(
    tree: &mut QueryTree,
    key: &str,
    path: &KeyPath<'_>,
    value: String,
    limits: &ListLimits,
) -> Result<(), Error> {
    let Some((last, parents)) = path.segments.split_last() else {
        return Err(Error::malformed("empty key"));
    };

    let mut current = tree;
    for segment in parents {
        let node = current
            .entry((*segment).to_owned())
            .or_insert_with(|| FilterNode::Map(BTreeMap::new()));
        current = match node {
            FilterNode::Map(m) => m,
            other => return Err(collision(key, other, "object")),
        };
    }

    match current.entry((*last).to_owned()) {
        Entry::Vacant(slot) => {
            slot.insert(if path.append {
                FilterNode::List(vec![value])
            } else {
                FilterNode::Leaf(value)
            });
        }
        Entry::Occupied(mut slot) => {
            let node = slot.get_mut();
            match node {
                FilterNode::Leaf(prev) => {
                    let first = std::mem::take(prev);
                    *node = FilterNode::List(vec![first, value]);
                }
                FilterNode::List(items) => items.push(value),
                FilterNode::Map(_) => return Err(collision(key, node, "scalar")),
            }
            if let FilterNode::List(items) = node
                && items.len() > limits.max_array_len
            {
                return Err(Error::malformed(format!(
                    "key '{key}' has more than {} values",
                    limits.max_array_len
                )));
            }
        }
    }
    Ok(())
}

/// Build a tree from already-decoded key/value pairs.
///
/// # Errors
/// Returns `Error::MalformedQuery` when a key exceeds the depth cap, a list
/// exceeds the array cap, a key is both scalar and object, or a key is
/// syntactically broken (`a[b`, `[x]`, `a[b]c`).
pub fn parse_pairs<I, K, V>(pairs: I, limits: &ListLimits) -> Result<QueryTree, Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut tree = QueryTree::new();
    for (key, value) in pairs {
        let key = key.as_ref();
        if key.is_empty() {
            continue;
        }
        let path = split_key(key)?;
        if path.segments.len() > limits.max_depth {
            return Err(Error::malformed(format!(
                "key '{key}' nests deeper than {} segments",
                limits.max_depth
            )));
        }
        insert(&mut tree, key, &path, value.into(), limits)?;
    }
    Ok(tree)
}

/// Decode an `application/x-www-form-urlencoded` query string and build its tree.
///
/// A leading `?` is ignored.
///
/// # Errors
/// Same as [`parse_pairs`].
pub fn parse_query_string(raw: &str, limits: &ListLimits) -> Result<QueryTree, Error> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    parse_pairs(url::form_urlencoded::parse(raw.as_bytes()), limits)
}
