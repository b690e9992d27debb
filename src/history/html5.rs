//! Path-based adapter over a driver with structured-entry support.

use std::rc::Rc;

use crate::history::{GoOutcome, LocationAdapter, LocationDriver, RouterMode};
use crate::path::{clean_path, parse_path};
use crate::scroll::ScrollPositionStore;

/// Normalizes a configured base path: leading slash, no trailing slash.
pub(crate) fn normalize_base(base: &str) -> String {
    let mut base = base.trim_end_matches('/').to_string();
    if !base.is_empty() && !base.starts_with('/') {
        base.insert(0, '/');
    }
    base
}

/// Uses the driver's real path as the routable location, minus a
/// configured base prefix.
pub struct Html5Adapter {
    driver: Rc<dyn LocationDriver>,
    base: String,
    /// Location at construction time, used to swallow the stray initial
    /// change event some hosts deliver on load.
    initial_location: String,
}

impl Html5Adapter {
    pub fn new(driver: Rc<dyn LocationDriver>, base: &str) -> Self {
        let base = normalize_base(base);
        let initial_location = routable_location(&driver.url(), &base);
        Self { driver, base, initial_location }
    }
}

impl LocationAdapter for Html5Adapter {
    fn mode(&self) -> RouterMode {
        RouterMode::Html5
    }

    fn current_location(&self) -> String {
        routable_location(&self.driver.url(), &self.base)
    }

    fn apply(&self, full_path: &str, replace: bool, store: &ScrollPositionStore) {
        let url = clean_path(&format!("{}{}", self.base, full_path));
        if replace {
            if self.driver.replace_state(store.current_key(), &url).is_err() {
                self.driver.replace(&url);
            }
        } else {
            // The outgoing entry's scroll offset belongs to the old key.
            store.save(self.driver.scroll_offset());
            let key = store.rotate_key();
            if self.driver.push_state(key, &url).is_err() {
                self.driver.assign(&url);
            }
        }
    }

    fn ensure(&self, full_path: &str, push: bool, store: &ScrollPositionStore) {
        if self.current_location() != full_path {
            self.apply(full_path, !push, store);
        }
    }

    fn go(&self, delta: i64) -> GoOutcome {
        self.driver.go(delta);
        GoOutcome::Deferred
    }

    fn accept_external(&self, location: &str, current_is_start: bool) -> bool {
        !(current_is_start && location == self.initial_location)
    }

    fn driver(&self) -> Option<Rc<dyn LocationDriver>> {
        Some(Rc::clone(&self.driver))
    }
}

/// Extracts `path?query#hash` relative to `base` from a driver URL. The
/// base comparison is case-insensitive; a URL outside the base is taken
/// as-is.
fn routable_location(url: &str, base: &str) -> String {
    let (path, query, hash) = parse_path(url);
    let path = match urlencoding::decode(&path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path,
    };

    let mut path = path;
    if !base.is_empty() {
        if let Some(rest) = strip_prefix_ignore_case(&path, base) {
            // Only strip at a segment boundary, so "/app" never eats into
            // "/application".
            if rest.is_empty() || rest.starts_with('/') {
                path = rest.to_string();
            }
        }
    }
    if path.is_empty() {
        path.push('/');
    }

    let query = if query.is_empty() {
        String::new()
    } else {
        format!("?{}", query)
    };
    format!("{}{}{}", path, query, hash)
}

/// Case-insensitive prefix strip that walks char boundaries, never byte
/// offsets of a lowercased copy.
fn strip_prefix_ignore_case<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = path;
    for expected in prefix.chars() {
        let mut chars = rest.chars();
        let actual = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        rest = chars.as_str();
    }
    Some(rest)
}
