//! The immutable route snapshot.
//!
//! A [`Route`] is what a committed navigation produces: the matched
//! location plus the root-to-leaf chain of records that matched it.
//! Snapshots are plain clonable values; the coordinator swaps the current
//! one atomically when a transition commits.

use std::collections::HashMap;
use std::rc::Rc;

use crate::location::Location;
use crate::map::RouteRecord;
use crate::query::{Query, StringifyQuery};

/// A resolved navigation: location data plus the matched record chain.
#[derive(Clone)]
pub struct Route {
    pub name: Option<String>,
    pub meta: HashMap<String, String>,
    pub path: String,
    pub hash: String,
    pub query: Query,
    pub params: HashMap<String, String>,
    /// Path plus serialized query plus hash.
    pub full_path: String,
    /// Matched records, root first, leaf last. Empty when nothing matched.
    pub matched: Vec<Rc<RouteRecord>>,
    /// Full path of the location a redirect replaced, when this route was
    /// reached through one.
    pub redirected_from: Option<String>,
}

impl Route {
    /// The initial route every coordinator starts from, before the first
    /// transition commits.
    pub fn start() -> Self {
        Self {
            name: None,
            meta: HashMap::new(),
            path: "/".to_string(),
            hash: String::new(),
            query: Query::new(),
            params: HashMap::new(),
            full_path: "/".to_string(),
            matched: Vec::new(),
            redirected_from: None,
        }
    }

    /// Whether this is the pristine pre-navigation route.
    ///
    /// Distinguishes the start state from a real navigation to `/`: the
    /// start route has an empty matched chain and no query or hash.
    pub fn is_start(&self) -> bool {
        self.path == "/"
            && self.name.is_none()
            && self.matched.is_empty()
            && self.query.is_empty()
            && self.hash.is_empty()
            && self.redirected_from.is_none()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("full_path", &self.full_path)
            .field("params", &self.params)
            .field("matched", &self.matched.len())
            .field("redirected_from", &self.redirected_from)
            .finish_non_exhaustive()
    }
}

/// Assembles a route snapshot from a matched record and its location.
pub(crate) fn create_route(
    record: Option<&Rc<RouteRecord>>,
    location: &Location,
    matched: Vec<Rc<RouteRecord>>,
    redirected_from: Option<&Location>,
    stringify: StringifyQuery,
) -> Route {
    let path = location.path.clone().unwrap_or_else(|| "/".to_string());
    let query = location.query.clone();
    Route {
        name: location
            .name
            .clone()
            .or_else(|| record.and_then(|r| r.name.clone())),
        meta: record.map(|r| r.meta.clone()).unwrap_or_default(),
        full_path: full_path(&path, &query, &location.hash, stringify),
        path,
        hash: location.hash.clone(),
        query,
        params: location.params.clone(),
        matched,
        redirected_from: redirected_from
            .map(|loc| full_path_of_location(loc, stringify)),
    }
}

pub(crate) fn full_path_of_location(location: &Location, stringify: StringifyQuery) -> String {
    full_path(
        location.path.as_deref().unwrap_or("/"),
        &location.query,
        &location.hash,
        stringify,
    )
}

fn full_path(path: &str, query: &Query, hash: &str, stringify: StringifyQuery) -> String {
    let path = if path.is_empty() { "/" } else { path };
    format!("{}{}{}", path, stringify(query), hash)
}

/// Whether two routes address the same location.
///
/// The start route only equals itself. Path-addressed routes compare path
/// (trailing-slash-insensitive), hash and query; name-addressed routes
/// compare name, query and params.
pub fn is_same_route(a: &Route, b: &Route) -> bool {
    if b.is_start() {
        return a.is_start();
    }
    if !a.path.is_empty() && !b.path.is_empty() {
        a.path.trim_end_matches('/') == b.path.trim_end_matches('/')
            && a.hash == b.hash
            && a.query == b.query
    } else if let (Some(a_name), Some(b_name)) = (&a.name, &b.name) {
        a_name == b_name && a.query == b.query && a.params == b.params
    } else {
        false
    }
}

/// Whether `target` is a prefix of `current`: same or an ancestor path,
/// with every query key of `target` present in `current` with the same
/// value, and a matching hash when `target` carries one.
pub fn is_included_route(current: &Route, target: &Route) -> bool {
    let current_path = current.path.trim_end_matches('/');
    let target_path = target.path.trim_end_matches('/');

    let path_included = current_path == target_path
        || (current_path.starts_with(target_path)
            && current_path[target_path.len()..].starts_with('/'));

    let hash_included = target.hash.is_empty() || current.hash == target.hash;

    let query_included = target
        .query
        .iter()
        .all(|(key, value)| current.query.get(key) == Some(value));

    path_included && hash_included && query_included
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str) -> Route {
        Route {
            path: path.to_string(),
            full_path: path.to_string(),
            hash: "#x".to_string(),
            ..Route::start()
        }
    }

    #[test]
    fn test_start_route_identity() {
        assert!(Route::start().is_start());
        assert!(is_same_route(&Route::start(), &Route::start()));
        assert!(!is_same_route(&route("/"), &Route::start()));
    }

    #[test]
    fn test_same_route_trailing_slash() {
        assert!(is_same_route(&route("/a/"), &route("/a")));
        assert!(!is_same_route(&route("/a"), &route("/b")));
    }

    #[test]
    fn test_included_route() {
        let current = Route { path: "/a/b".into(), ..Route::start() };
        let parent = Route { path: "/a".into(), ..Route::start() };
        let sibling = Route { path: "/ab".into(), ..Route::start() };
        assert!(is_included_route(&current, &parent));
        assert!(!is_included_route(&current, &sibling));
        assert!(!is_included_route(&parent, &current));
    }

    #[test]
    fn test_included_route_query_subset() {
        let mut current = Route { path: "/a".into(), ..Route::start() };
        current.query = crate::query::parse_query("x=1&y=2");
        let mut target = Route { path: "/a".into(), ..Route::start() };
        target.query = crate::query::parse_query("x=1");
        assert!(is_included_route(&current, &target));

        target.query = crate::query::parse_query("x=9");
        assert!(!is_included_route(&current, &target));
    }
}
