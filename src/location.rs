//! Navigation intents and their normalized form.
//!
//! A [`RawLocation`] is what callers hand to `push`/`replace`/`resolve`:
//! either a bare path string or a structured [`LocationSpec`].
//! Normalization resolves relative paths against the current route,
//! splits off query and hash, and merges any extra query map, producing
//! the [`Location`] the matcher consumes. Re-entrant matcher calls
//! (redirects, aliases) construct already-normalized locations directly.

use std::collections::HashMap;

use crate::path::{parse_path, resolve_path};
use crate::query::{resolve_query, ParseQuery, Query};
use crate::route::Route;

/// A structured navigation intent.
///
/// `None` fields are *omitted*, which matters for redirect merging: a
/// redirect target that omits `query`/`hash`/`params` inherits them from
/// the original location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationSpec {
    pub name: Option<String>,
    pub path: Option<String>,
    pub params: Option<HashMap<String, String>>,
    pub query: Option<Query>,
    pub hash: Option<String>,
    /// Resolve a relative path by appending to the current path instead of
    /// replacing its last segment.
    pub append: bool,
}

impl LocationSpec {
    pub fn path(path: impl Into<String>) -> Self {
        Self { path: Some(path.into()), ..Self::default() }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }
}

/// A raw navigation intent: a path string or a structured spec.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLocation {
    Path(String),
    Spec(LocationSpec),
}

impl From<&str> for RawLocation {
    fn from(path: &str) -> Self {
        RawLocation::Path(path.to_string())
    }
}

impl From<String> for RawLocation {
    fn from(path: String) -> Self {
        RawLocation::Path(path)
    }
}

impl From<LocationSpec> for RawLocation {
    fn from(spec: LocationSpec) -> Self {
        RawLocation::Spec(spec)
    }
}

/// The normalized form of a navigation intent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub name: Option<String>,
    pub path: Option<String>,
    pub params: HashMap<String, String>,
    pub query: Query,
    pub hash: String,
}

impl Location {
    pub(crate) fn from_path(path: impl Into<String>) -> Self {
        Self { path: Some(path.into()), ..Self::default() }
    }
}

/// Normalizes a raw intent against the current route.
///
/// - A named intent passes through with its params cloned.
/// - A params-only intent (no name, no path) re-targets the current route:
///   its name when it has one, otherwise the deepest matched record's own
///   template filled with the merged params.
/// - A path intent resolves relative to `current.path`, splits query and
///   hash out of the path text, and overlays the spec's extra query map.
pub fn normalize_location(
    raw: &RawLocation,
    current: Option<&Route>,
    append: bool,
    parse: ParseQuery,
) -> Location {
    let spec = match raw {
        RawLocation::Path(path) => LocationSpec::path(path.clone()),
        RawLocation::Spec(spec) => spec.clone(),
    };

    if let Some(name) = spec.name {
        return Location {
            name: Some(name),
            path: spec.path,
            params: spec.params.unwrap_or_default(),
            query: spec.query.unwrap_or_default(),
            hash: spec.hash.unwrap_or_default(),
        };
    }

    // Params-only relative navigation: keep the current target, swap params.
    if spec.path.is_none() {
        if let (Some(params), Some(current)) = (spec.params.as_ref(), current) {
            let mut merged = current.params.clone();
            merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

            if let Some(name) = &current.name {
                return Location {
                    name: Some(name.clone()),
                    path: None,
                    params: merged,
                    query: spec.query.unwrap_or_else(|| current.query.clone()),
                    hash: spec.hash.unwrap_or_else(|| current.hash.clone()),
                };
            }
            if let Some(record) = current.matched.last() {
                let path = crate::pattern::fill_params(&record.path, &merged)
                    .unwrap_or_else(|err| {
                        tracing::warn!(%err, "relative params navigation failed");
                        String::new()
                    });
                return Location {
                    name: None,
                    path: Some(path),
                    params: merged,
                    query: spec.query.unwrap_or_else(|| current.query.clone()),
                    hash: spec.hash.unwrap_or_else(|| current.hash.clone()),
                };
            }
            tracing::warn!("relative params navigation requires a current route");
        }
    }

    let (parsed_path, search, parsed_hash) =
        parse_path(spec.path.as_deref().unwrap_or(""));
    let base_path = current.map(|c| c.path.as_str()).unwrap_or("/");
    let path = if parsed_path.is_empty() {
        base_path.to_string()
    } else {
        resolve_path(&parsed_path, base_path, append || spec.append)
    };

    let query = resolve_query(&search, spec.query.as_ref(), parse);

    let mut hash = spec.hash.unwrap_or(parsed_hash);
    if !hash.is_empty() && !hash.starts_with('#') {
        hash.insert(0, '#');
    }

    Location {
        name: None,
        path: Some(path),
        params: HashMap::new(),
        query,
        hash,
    }
}
