//! # Waymark
//!
//! A client-side routing library: declarative route configuration, URL
//! matching and a serialized navigation state machine, decoupled from any
//! particular host through a driver trait. Supports:
//!
//! - Static routes (`/about`)
//! - Dynamic parameters (`/user/:id`)
//! - Optional parameters (`/posts/:page?`)
//! - Wildcards (`*`, `/docs/*rest`)
//! - Nested routes, named routes, redirects and aliases
//! - Navigation guards with redirect/abort decisions
//! - Html5, hash and in-memory history modes
//! - Scroll position restoration across history traversal
//!
//! ## Navigation Model
//!
//! All navigation funnels through one coordinator: the target is matched
//! (following redirects and aliases), the guard pipeline runs, and only
//! then does the current route change and the URL update. A navigation
//! started while another is in flight supersedes it; the older one
//! resolves as aborted.
//!
//! ## Example
//!
//! ```
//! use waymark::{Router, RouterOptions, RouteConfig};
//!
//! let router = Router::new(RouterOptions {
//!     routes: vec![
//!         RouteConfig::new("/").with_name("home").with_component("Home"),
//!         RouteConfig::new("/user/:id").with_name("user").with_component("User"),
//!     ],
//!     ..RouterOptions::default()
//! });
//! router.init().unwrap();
//!
//! let route = router.push("/user/42").unwrap();
//! assert_eq!(route.name.as_deref(), Some("user"));
//! assert_eq!(route.params.get("id").map(String::as_str), Some("42"));
//! ```

use std::rc::Rc;

// ============================================================================
// Module Declarations
// ============================================================================

pub mod error;
pub mod guard;
pub mod history;
pub mod location;
pub mod map;
pub mod matcher;
pub mod path;
pub mod pattern;
pub mod query;
pub mod route;
pub mod scroll;

pub use error::RouterError;
pub use guard::{AfterHook, GuardDecision, NavigationGuard};
pub use history::hash::HashAdapter;
pub use history::html5::Html5Adapter;
pub use history::memory::{MemoryAdapter, MemoryDriver};
pub use history::{
    GoOutcome, HistoryCoordinator, LocationAdapter, LocationDriver, RouterMode,
};
pub use location::{Location, LocationSpec, RawLocation};
pub use map::{
    PropsMode, PropsSpec, Redirect, RedirectTarget, RouteConfig, RouteRecord,
};
pub use matcher::Matcher;
pub use query::{parse_query, stringify_query, ParseQuery, Query, QueryValue, StringifyQuery};
pub use route::{is_included_route, is_same_route, Route};
pub use scroll::{Position, ScrollBehavior, ScrollTarget, StateKey};

use crate::history::html5::normalize_base;
use crate::path::clean_path;

// ============================================================================
// Router
// ============================================================================

/// Construction-time configuration for a [`Router`].
pub struct RouterOptions {
    pub routes: Vec<RouteConfig>,
    /// Requested history mode. Without a driver the router always runs in
    /// memory mode regardless of this setting.
    pub mode: RouterMode,
    /// Application base path, stripped from and prepended to real URLs in
    /// html5 mode and used for [`Router::resolve`] hrefs.
    pub base: String,
    pub driver: Option<Rc<dyn LocationDriver>>,
    pub scroll_behavior: Option<Rc<ScrollBehavior>>,
    pub parse_query: ParseQuery,
    pub stringify_query: StringifyQuery,
    /// Fall back from html5 to hash mode when the driver has no
    /// structured-entry support.
    pub fallback: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            mode: RouterMode::Hash,
            base: String::new(),
            driver: None,
            scroll_behavior: None,
            parse_query: query::parse_query,
            stringify_query: query::stringify_query,
            fallback: true,
        }
    }
}

/// Everything [`Router::resolve`] knows about a navigation target without
/// performing it.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The normalized intent.
    pub location: Location,
    /// The route it would commit.
    pub route: Route,
    /// A driver-level link for the target, base and mode applied.
    pub href: String,
}

/// The front door: owns the matcher and the history coordinator.
pub struct Router {
    matcher: Rc<Matcher>,
    history: HistoryCoordinator,
    mode: RouterMode,
    base: String,
}

impl Router {
    pub fn new(options: RouterOptions) -> Self {
        let mode = match &options.driver {
            None => {
                if options.mode != RouterMode::Memory {
                    tracing::debug!(requested = ?options.mode, "no driver; running in memory mode");
                }
                RouterMode::Memory
            }
            Some(driver) => match options.mode {
                RouterMode::Html5 if !driver.supports_push_state() && options.fallback => {
                    tracing::warn!("driver lacks push state; falling back to hash mode");
                    RouterMode::Hash
                }
                mode => mode,
            },
        };

        let matcher = Rc::new(Matcher::new(
            &options.routes,
            options.parse_query,
            options.stringify_query,
        ));

        let base = normalize_base(&options.base);
        let adapter: Rc<dyn LocationAdapter> = match (mode, options.driver) {
            (RouterMode::Html5, Some(driver)) => Rc::new(Html5Adapter::new(driver, &base)),
            (RouterMode::Hash, Some(driver)) => Rc::new(HashAdapter::new(driver)),
            _ => Rc::new(MemoryAdapter::new()),
        };

        let history =
            HistoryCoordinator::new(Rc::clone(&matcher), adapter, options.scroll_behavior);

        Self { matcher, history, mode, base }
    }

    /// The mode the router actually runs in, after fallback.
    pub fn mode(&self) -> RouterMode {
        self.mode
    }

    pub fn current_route(&self) -> Route {
        self.history.current_route()
    }

    /// Runs the initial navigation from the driver's current location.
    pub fn init(&self) -> Result<Route, RouterError> {
        self.history.init()
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn push(&self, to: impl Into<RawLocation>) -> Result<Route, RouterError> {
        self.history.push(&to.into())
    }

    pub fn replace(&self, to: impl Into<RawLocation>) -> Result<Route, RouterError> {
        self.history.replace(&to.into())
    }

    pub fn go(&self, delta: i64) {
        self.history.go(delta);
    }

    pub fn back(&self) {
        self.go(-1);
    }

    pub fn forward(&self) {
        self.go(1);
    }

    /// Host entry point for driver-originated location changes.
    pub fn handle_external_change(&self) -> Result<Route, RouterError> {
        self.history.handle_external_change()
    }

    // ------------------------------------------------------------------
    // Hooks and observers
    // ------------------------------------------------------------------

    pub fn before_each(&self, guard: impl Fn(&Route, &Route) -> GuardDecision + 'static) {
        self.history.hooks.add_before(guard);
    }

    pub fn before_resolve(&self, guard: impl Fn(&Route, &Route) -> GuardDecision + 'static) {
        self.history.hooks.add_resolve(guard);
    }

    pub fn after_each(&self, hook: impl Fn(&Route, &Route) + 'static) {
        self.history.hooks.add_after(hook);
    }

    /// Registers a route-change listener, called after every commit with
    /// `(new, previous)`.
    pub fn listen(&self, listener: impl Fn(&Route, &Route) + 'static) {
        self.history.listen(listener);
    }

    pub fn on_ready(
        &self,
        on_complete: impl Fn(&Route) + 'static,
        on_error: impl Fn(&RouterError) + 'static,
    ) {
        self.history.on_ready(on_complete, on_error);
    }

    pub fn on_error(&self, callback: impl Fn(&RouterError) + 'static) {
        self.history.on_error(callback);
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Resolves a target without navigating.
    ///
    /// The href points at the *requested* URL: when the target hits a
    /// redirect, the link shows the original location and the redirect
    /// happens on navigation.
    pub fn resolve(&self, to: impl Into<RawLocation>) -> Resolved {
        let raw = to.into();
        let current = self.current_route();
        let location = location::normalize_location(
            &raw,
            Some(&current),
            false,
            self.matcher.parse_query(),
        );
        let route = self.matcher.match_location(&raw, Some(&current), None);
        let full_path = route
            .redirected_from
            .clone()
            .unwrap_or_else(|| route.full_path.clone());
        let href = create_href(&self.base, &full_path, self.mode);
        Resolved { location, route, href }
    }

    /// Appends routes to the table, then re-runs the current location so
    /// it can pick up a better match.
    pub fn add_routes(&self, routes: Vec<RouteConfig>) {
        self.matcher.add_routes(&routes);
        if !self.current_route().is_start() {
            let _ = self.history.refresh();
        }
    }

    /// Component handles of every record matched by `route` (or the
    /// current route), root first.
    pub fn get_matched_components(&self, route: Option<&Route>) -> Vec<String> {
        let current = self.current_route();
        let route = route.unwrap_or(&current);
        route
            .matched
            .iter()
            .flat_map(|record| record.components.values().cloned())
            .collect()
    }
}

fn create_href(base: &str, full_path: &str, mode: RouterMode) -> String {
    let path = match mode {
        RouterMode::Hash => format!("#{}", full_path),
        _ => full_path.to_string(),
    };
    if base.is_empty() {
        path
    } else {
        clean_path(&format!("{}/{}", base, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_href() {
        assert_eq!(create_href("", "/a", RouterMode::Html5), "/a");
        assert_eq!(create_href("/app", "/a", RouterMode::Html5), "/app/a");
        assert_eq!(create_href("", "/a", RouterMode::Hash), "#/a");
        assert_eq!(create_href("/app", "/a", RouterMode::Hash), "/app/#/a");
    }

    #[test]
    fn test_memory_mode_without_driver() {
        let router = Router::new(RouterOptions {
            mode: RouterMode::Html5,
            ..RouterOptions::default()
        });
        assert_eq!(router.mode(), RouterMode::Memory);
    }

    #[test]
    fn test_fallback_to_hash() {
        let driver = Rc::new(MemoryDriver::without_push_state("/"));
        let router = Router::new(RouterOptions {
            mode: RouterMode::Html5,
            driver: Some(driver),
            ..RouterOptions::default()
        });
        assert_eq!(router.mode(), RouterMode::Hash);
    }
}
