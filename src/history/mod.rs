//! Session history: drivers, adapters and the transition coordinator.
//!
//! Three layers separate policy from environment:
//!
//! - [`LocationDriver`] is the host's raw URL bar and history stack. The
//!   crate ships [`MemoryDriver`](memory::MemoryDriver) for tests and
//!   headless use; embedders implement the trait for a real browser
//!   surface.
//! - [`LocationAdapter`] maps between routable full paths and what the
//!   driver shows: [`Html5Adapter`](html5::Html5Adapter) uses the path
//!   itself, [`HashAdapter`](hash::HashAdapter) the fragment, and
//!   [`MemoryAdapter`](memory::MemoryAdapter) an in-process stack with no
//!   driver at all.
//! - [`HistoryCoordinator`] serializes transitions: it matches the target,
//!   runs the guard pipeline, commits the new current route and syncs the
//!   adapter, with a token check so a navigation started mid-flight
//!   supersedes the older one.

pub mod hash;
pub mod html5;
pub mod memory;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::RouterError;
use crate::guard::{GuardDecision, HookRegistry};
use crate::location::RawLocation;
use crate::matcher::Matcher;
use crate::route::{is_same_route, Route};
use crate::scroll::{resolve_target, Position, ScrollBehavior, ScrollPositionStore, StateKey};

/// Which adapter a router runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterMode {
    /// Real paths via the driver's structured-entry API.
    Html5,
    /// Routable path stored in the URL fragment.
    Hash,
    /// No driver; history is an in-process stack.
    Memory,
}

/// The host environment's URL and history surface.
///
/// All methods are synchronous; a traversal requested with [`go`](Self::go)
/// surfaces later as an external change the host feeds back through
/// [`HistoryCoordinator::handle_external_change`].
pub trait LocationDriver {
    /// The current URL as `path?query#hash` (no scheme or authority).
    fn url(&self) -> String;

    /// Pushes a new entry carrying `key`. An `Err` makes the adapter fall
    /// back to a full-load [`assign`](Self::assign).
    fn push_state(&self, key: StateKey, url: &str) -> Result<(), RouterError>;

    /// Replaces the current entry, keeping its position in the stack.
    fn replace_state(&self, key: StateKey, url: &str) -> Result<(), RouterError>;

    /// Full-load navigation to `url`, adding an entry.
    fn assign(&self, url: &str);

    /// Full-load navigation to `url`, replacing the current entry.
    fn replace(&self, url: &str);

    /// Moves `delta` entries through the stack.
    fn go(&self, delta: i64);

    /// Whether structured entries are available at all.
    fn supports_push_state(&self) -> bool {
        true
    }

    /// The key stored on the current entry, if it carries one.
    fn state_key(&self) -> Option<StateKey>;

    /// Current viewport offset.
    fn scroll_offset(&self) -> Position {
        Position::default()
    }

    /// Scrolls the viewport.
    fn scroll_to(&self, _position: Position) {}

    /// Resolves a selector to a position, shifted by `offset`. `None` when
    /// no element matches (or selectors are unsupported).
    fn element_position(&self, _selector: &str, _offset: Position) -> Option<Position> {
        None
    }
}

/// Outcome of asking an adapter to traverse.
pub enum GoOutcome {
    /// The driver was told to move; the change arrives externally.
    Deferred,
    /// The target entry is out of range; nothing happens.
    Ignored,
    /// In-process stack: the target is known now. The coordinator runs the
    /// transition and calls [`LocationAdapter::finish_go`] with `index` on
    /// completion.
    Resolve { location: String, index: isize },
}

/// Translation between routable full paths and driver URLs.
pub trait LocationAdapter {
    fn mode(&self) -> RouterMode;

    /// The routable full path the driver currently shows.
    fn current_location(&self) -> String;

    /// Writes `full_path` to the driver as a push or replace.
    fn apply(&self, full_path: &str, replace: bool, store: &ScrollPositionStore);

    /// Re-syncs the driver to `full_path` if it drifted (e.g. after an
    /// aborted transition). `push` adds an entry, otherwise replaces.
    fn ensure(&self, full_path: &str, push: bool, store: &ScrollPositionStore);

    fn go(&self, delta: i64) -> GoOutcome;

    /// Commits an in-process traversal resolved earlier by [`go`](Self::go).
    fn finish_go(&self, _index: isize) {}

    /// Whether an externally observed location should start a transition.
    /// Adapters use this to suppress echoes of their own writes.
    fn accept_external(&self, _location: &str, _current_is_start: bool) -> bool {
        true
    }

    fn driver(&self) -> Option<Rc<dyn LocationDriver>>;
}

enum TransitionKind {
    /// An in-app navigation; the adapter is written after commit.
    Push { replace: bool },
    /// The location already changed underneath us (traversal or external
    /// edit); `index` carries a memory-stack target to commit.
    Pop { index: Option<isize> },
}

/// Serializes navigations and owns the current route.
pub struct HistoryCoordinator {
    matcher: Rc<Matcher>,
    adapter: Rc<dyn LocationAdapter>,
    current: RefCell<Route>,
    /// Token of the in-flight transition; 0 when idle. A transition checks
    /// it between guard stages and yields to any newer token.
    pending: Cell<u64>,
    token_seq: Cell<u64>,
    ready_outcome: RefCell<Option<Result<Route, RouterError>>>,
    ready_cbs: RefCell<Vec<Box<dyn Fn(&Route)>>>,
    ready_error_cbs: RefCell<Vec<Box<dyn Fn(&RouterError)>>>,
    error_cbs: RefCell<Vec<Rc<dyn Fn(&RouterError)>>>,
    listeners: RefCell<Vec<Rc<dyn Fn(&Route, &Route)>>>,
    pub(crate) hooks: HookRegistry,
    scroll: ScrollPositionStore,
    scroll_behavior: Option<Rc<ScrollBehavior>>,
}

impl HistoryCoordinator {
    pub fn new(
        matcher: Rc<Matcher>,
        adapter: Rc<dyn LocationAdapter>,
        scroll_behavior: Option<Rc<ScrollBehavior>>,
    ) -> Self {
        Self {
            matcher,
            adapter,
            current: RefCell::new(Route::start()),
            pending: Cell::new(0),
            token_seq: Cell::new(0),
            ready_outcome: RefCell::new(None),
            ready_cbs: RefCell::new(Vec::new()),
            ready_error_cbs: RefCell::new(Vec::new()),
            error_cbs: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            hooks: HookRegistry::default(),
            scroll: ScrollPositionStore::new(),
            scroll_behavior,
        }
    }

    pub fn current_route(&self) -> Route {
        self.current.borrow().clone()
    }

    pub fn adapter(&self) -> &Rc<dyn LocationAdapter> {
        &self.adapter
    }

    /// Registers a route-change listener, called after every commit with
    /// `(new, previous)`.
    pub fn listen(&self, listener: impl Fn(&Route, &Route) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Registers callbacks for the first settled navigation. Fires
    /// immediately when it already settled.
    pub fn on_ready(
        &self,
        on_complete: impl Fn(&Route) + 'static,
        on_error: impl Fn(&RouterError) + 'static,
    ) {
        let outcome = self.ready_outcome.borrow().clone();
        match outcome {
            Some(Ok(route)) => on_complete(&route),
            Some(Err(err)) => on_error(&err),
            None => {
                self.ready_cbs.borrow_mut().push(Box::new(on_complete));
                self.ready_error_cbs.borrow_mut().push(Box::new(on_error));
            }
        }
    }

    pub fn on_error(&self, callback: impl Fn(&RouterError) + 'static) {
        self.error_cbs.borrow_mut().push(Rc::new(callback));
    }

    /// Runs the initial transition from whatever the adapter shows.
    pub fn init(&self) -> Result<Route, RouterError> {
        let location = self.adapter.current_location();
        self.transition_to(&location.into(), TransitionKind::Pop { index: None })
    }

    pub fn push(&self, raw: &RawLocation) -> Result<Route, RouterError> {
        self.transition_to(raw, TransitionKind::Push { replace: false })
    }

    pub fn replace(&self, raw: &RawLocation) -> Result<Route, RouterError> {
        self.transition_to(raw, TransitionKind::Push { replace: true })
    }

    /// Traverses the history stack. For driver-backed adapters the result
    /// arrives later through [`handle_external_change`](Self::handle_external_change);
    /// the memory adapter resolves in-process.
    pub fn go(&self, delta: i64) {
        match self.adapter.go(delta) {
            GoOutcome::Deferred | GoOutcome::Ignored => {}
            GoOutcome::Resolve { location, index } => {
                let _ = self.transition_to(
                    &location.into(),
                    TransitionKind::Pop { index: Some(index) },
                );
            }
        }
    }

    /// Entry point for driver-originated changes (history traversal, URL
    /// edits). The host calls this when the driver's location changes for
    /// any reason other than this coordinator's own writes.
    pub fn handle_external_change(&self) -> Result<Route, RouterError> {
        let location = self.adapter.current_location();
        let current_is_start = self.current.borrow().is_start();
        if !self.adapter.accept_external(&location, current_is_start) {
            return Err(RouterError::NavigationDuplicated(location));
        }

        // The outgoing entry's scroll offset has to be captured before its
        // key is replaced by the entry we traversed to.
        if self.scroll_behavior.is_some() {
            if let Some(driver) = self.adapter.driver() {
                self.scroll.save(driver.scroll_offset());
                if let Some(key) = driver.state_key() {
                    self.scroll.set_key(key);
                }
            }
        }

        self.transition_to(&location.into(), TransitionKind::Pop { index: None })
    }

    /// Re-matches and re-runs the current location, used after the route
    /// table grows.
    pub fn refresh(&self) -> Result<Route, RouterError> {
        let full_path = self.current.borrow().full_path.clone();
        self.transition_to(&full_path.into(), TransitionKind::Pop { index: None })
    }

    pub(crate) fn scroll_store(&self) -> &ScrollPositionStore {
        &self.scroll
    }

    fn transition_to(
        &self,
        raw: &RawLocation,
        kind: TransitionKind,
    ) -> Result<Route, RouterError> {
        let current = self.current.borrow().clone();
        let route = self.matcher.match_location(raw, Some(&current), None);
        let result = self.confirm_transition(route, kind);

        if self.ready_outcome.borrow().is_none() {
            match &result {
                Ok(route) => {
                    *self.ready_outcome.borrow_mut() = Some(Ok(route.clone()));
                    self.ready_error_cbs.borrow_mut().clear();
                    let cbs = std::mem::take(&mut *self.ready_cbs.borrow_mut());
                    for cb in cbs {
                        cb(route);
                    }
                }
                Err(err) => {
                    *self.ready_outcome.borrow_mut() = Some(Err(err.clone()));
                    self.ready_cbs.borrow_mut().clear();
                    let cbs = std::mem::take(&mut *self.ready_error_cbs.borrow_mut());
                    for cb in cbs {
                        cb(err);
                    }
                }
            }
        }

        result
    }

    fn confirm_transition(
        &self,
        route: Route,
        kind: TransitionKind,
    ) -> Result<Route, RouterError> {
        let current = self.current.borrow().clone();

        if is_same_route(&route, &current) && route.matched.len() == current.matched.len() {
            self.ensure_url(false);
            if let TransitionKind::Pop { index: Some(index) } = kind {
                // A traversal to an equivalent entry still moves the stack.
                self.adapter.finish_go(index);
            }
            return Err(RouterError::NavigationDuplicated(route.full_path));
        }

        let token = self.token_seq.get() + 1;
        self.token_seq.set(token);
        self.pending.set(token);
        let is_pop = matches!(kind, TransitionKind::Pop { .. });

        let before = self.snapshot(&self.hooks.before);
        for guard in before {
            match self.consult(&*guard, &route, &current, token)? {
                ControlFlow::Continue => {}
                ControlFlow::Redirect(target) => return self.redirect(target, kind),
            }
        }

        // Per-record enter guards run root to leaf over the records this
        // transition newly activates.
        let divergence = route
            .matched
            .iter()
            .zip(current.matched.iter())
            .take_while(|(a, b)| Rc::ptr_eq(a, b))
            .count();
        let enter_guards: Vec<_> = route.matched[divergence..]
            .iter()
            .filter_map(|record| record.before_enter.clone())
            .collect();
        for guard in enter_guards {
            match self.consult(&*guard, &route, &current, token)? {
                ControlFlow::Continue => {}
                ControlFlow::Redirect(target) => return self.redirect(target, kind),
            }
        }

        let resolve = self.snapshot(&self.hooks.resolve);
        for guard in resolve {
            match self.consult(&*guard, &route, &current, token)? {
                ControlFlow::Continue => {}
                ControlFlow::Redirect(target) => return self.redirect(target, kind),
            }
        }

        if self.pending.get() != token {
            return Err(RouterError::NavigationAborted);
        }
        self.pending.set(0);

        let prev = std::mem::replace(&mut *self.current.borrow_mut(), route.clone());
        match kind {
            TransitionKind::Push { replace } => {
                self.adapter.apply(&route.full_path, replace, &self.scroll);
            }
            TransitionKind::Pop { index } => {
                if let Some(index) = index {
                    self.adapter.finish_go(index);
                }
            }
        }

        tracing::debug!(from = %prev.full_path, to = %route.full_path, "navigation committed");

        // Snapshot first: a listener may register further listeners.
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&route, &prev);
        }
        let after = self.hooks.after.borrow().clone();
        for hook in after {
            hook(&route, &prev);
        }

        self.handle_scroll(&route, &prev, is_pop);

        Ok(route)
    }

    /// Runs one guard, yielding to any navigation that superseded this one
    /// while the guard had control.
    fn consult(
        &self,
        guard: &(dyn Fn(&Route, &Route) -> GuardDecision),
        route: &Route,
        current: &Route,
        token: u64,
    ) -> Result<ControlFlow, RouterError> {
        if self.pending.get() != token {
            return Err(RouterError::NavigationAborted);
        }
        match guard(route, current) {
            GuardDecision::Proceed => {
                if self.pending.get() != token {
                    return Err(RouterError::NavigationAborted);
                }
                Ok(ControlFlow::Continue)
            }
            GuardDecision::Abort => {
                if self.pending.get() == token {
                    self.pending.set(0);
                    self.ensure_url(true);
                }
                self.fire_error(&RouterError::NavigationAborted);
                Err(RouterError::NavigationAborted)
            }
            GuardDecision::Redirect(target) => {
                if self.pending.get() == token {
                    self.pending.set(0);
                }
                Ok(ControlFlow::Redirect(target))
            }
        }
    }

    fn redirect(&self, target: RawLocation, kind: TransitionKind) -> Result<Route, RouterError> {
        // A guard redirect replaces the entry a replace would have
        // written; a pop becomes a fresh push.
        let replace = matches!(kind, TransitionKind::Push { replace: true });
        self.transition_to(&target, TransitionKind::Push { replace })
    }

    fn snapshot<T: ?Sized>(&self, hooks: &RefCell<Vec<Rc<T>>>) -> Vec<Rc<T>> {
        hooks.borrow().clone()
    }

    fn ensure_url(&self, push: bool) {
        let full_path = self.current.borrow().full_path.clone();
        self.adapter.ensure(&full_path, push, &self.scroll);
    }

    fn fire_error(&self, err: &RouterError) {
        let cbs = self.error_cbs.borrow().clone();
        for cb in cbs {
            cb(err);
        }
    }

    fn handle_scroll(&self, to: &Route, from: &Route, is_pop: bool) {
        let Some(behavior) = self.scroll_behavior.as_ref() else {
            return;
        };
        let Some(driver) = self.adapter.driver() else {
            return;
        };
        let saved = if is_pop { self.scroll.saved() } else { None };
        match behavior(to, from, saved) {
            Ok(Some(target)) => {
                if let Some(position) = resolve_target(&target, driver.as_ref()) {
                    driver.scroll_to(position);
                }
            }
            Ok(None) => {}
            Err(message) => {
                tracing::error!(%message, "scroll behavior failed");
            }
        }
    }
}

enum ControlFlow {
    Continue,
    Redirect(RawLocation),
}
