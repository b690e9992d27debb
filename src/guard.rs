//! Navigation guards.
//!
//! A guard is a pluggable policy consulted before a transition commits.
//! All guard stages share one fixed signature: `(candidate, current)` in,
//! [`GuardDecision`] out. After-hooks run post-commit and are infallible
//! observers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::location::RawLocation;
use crate::route::Route;

/// Outcome of consulting a single guard.
pub enum GuardDecision {
    /// Continue with the transition.
    Proceed,
    /// Abandon this transition and navigate somewhere else instead.
    Redirect(RawLocation),
    /// Abandon this transition.
    Abort,
}

/// A navigation guard: `(candidate route, current route)` → decision.
pub type NavigationGuard = dyn Fn(&Route, &Route) -> GuardDecision;

/// A post-commit observer: `(new route, previous route)`.
pub type AfterHook = dyn Fn(&Route, &Route);

/// Global hook registries, consulted in registration order.
#[derive(Default)]
pub(crate) struct HookRegistry {
    pub before: RefCell<Vec<Rc<NavigationGuard>>>,
    pub resolve: RefCell<Vec<Rc<NavigationGuard>>>,
    pub after: RefCell<Vec<Rc<AfterHook>>>,
}

impl HookRegistry {
    pub fn add_before(&self, guard: impl Fn(&Route, &Route) -> GuardDecision + 'static) {
        self.before.borrow_mut().push(Rc::new(guard));
    }

    pub fn add_resolve(&self, guard: impl Fn(&Route, &Route) -> GuardDecision + 'static) {
        self.resolve.borrow_mut().push(Rc::new(guard));
    }

    pub fn add_after(&self, hook: impl Fn(&Route, &Route) + 'static) {
        self.after.borrow_mut().push(Rc::new(hook));
    }
}
