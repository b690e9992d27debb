//! Fragment-based adapter: the routable path lives after `#`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::history::{GoOutcome, LocationAdapter, LocationDriver, RouterMode};
use crate::scroll::ScrollPositionStore;

/// Stores the routable location in the URL fragment, so the part the
/// server sees never changes. Falls back to full-load writes when the
/// driver has no structured-entry support.
pub struct HashAdapter {
    driver: Rc<dyn LocationDriver>,
    supports_push: bool,
    /// Last location this adapter wrote or accepted; hash writes echo back
    /// as change events and must not start a second transition.
    last_seen: RefCell<Option<String>>,
}

impl HashAdapter {
    pub fn new(driver: Rc<dyn LocationDriver>) -> Self {
        let supports_push = driver.supports_push_state();
        Self {
            driver,
            supports_push,
            last_seen: RefCell::new(None),
        }
    }

    /// Rebuilds the full driver URL with `full_path` as the fragment,
    /// keeping whatever precedes the `#`.
    fn url_for(&self, full_path: &str) -> String {
        let current = self.driver.url();
        let head = current.split('#').next().unwrap_or("");
        format!("{}#{}", head, full_path)
    }
}

impl LocationAdapter for HashAdapter {
    fn mode(&self) -> RouterMode {
        RouterMode::Hash
    }

    fn current_location(&self) -> String {
        let url = self.driver.url();
        let fragment = match url.split_once('#') {
            Some((_, fragment)) => fragment,
            None => "",
        };
        if fragment.is_empty() {
            "/".to_string()
        } else if fragment.starts_with('/') {
            fragment.to_string()
        } else {
            format!("/{}", fragment)
        }
    }

    fn apply(&self, full_path: &str, replace: bool, store: &ScrollPositionStore) {
        let url = self.url_for(full_path);
        if self.supports_push && !replace {
            store.save(self.driver.scroll_offset());
            let key = store.rotate_key();
            if self.driver.push_state(key, &url).is_err() {
                self.driver.assign(&url);
            }
        } else if self.supports_push {
            if self.driver.replace_state(store.current_key(), &url).is_err() {
                self.driver.replace(&url);
            }
        } else if replace {
            self.driver.replace(&url);
        } else {
            self.driver.assign(&url);
        }
        *self.last_seen.borrow_mut() = Some(full_path.to_string());
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

    fn accept_external(&self, location: &str, _current_is_start: bool) -> bool {
        let mut last_seen = self.last_seen.borrow_mut();
        if last_seen.as_deref() == Some(location) {
            return false;
        }
        *last_seen = Some(location.to_string());
        true
    }

    fn driver(&self) -> Option<Rc<dyn LocationDriver>> {
        Some(Rc::clone(&self.driver))
    }
}
