//! Scroll position persistence across history entries.
//!
//! Each history entry carries a [`StateKey`]; positions are saved under
//! the key of the entry being left and looked up again when traversal
//! returns to it. What to do with a restored position is the host's call,
//! expressed through a [`ScrollBehavior`] callback.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;

use crate::history::LocationDriver;
use crate::route::Route;

/// A viewport offset in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

static LAST_KEY: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));

/// Identity of one history entry, stable across traversal.
///
/// Keys are monotonic: each generated key is strictly greater than every
/// key generated before it in this process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey(pub u64);

impl StateKey {
    pub fn generate() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        let mut prev = LAST_KEY.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match LAST_KEY.compare_exchange(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return StateKey(next),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Where the viewport should end up after a navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrollTarget {
    /// An absolute offset.
    Position(Position),
    /// An element looked up by selector, plus an offset from it. When the
    /// selector resolves to nothing, `fallback` applies (or the scroll is
    /// skipped entirely when there is no fallback).
    Selector {
        selector: String,
        offset: Position,
        fallback: Option<Position>,
    },
}

/// Host policy deciding the scroll target for a committed navigation.
///
/// Arguments are `(to, from, saved)` where `saved` is the position stored
/// for the entry being re-entered, present only on history traversal.
/// `Ok(None)` leaves the viewport alone; `Err` is reported and skipped.
pub type ScrollBehavior = dyn Fn(&Route, &Route, Option<Position>) -> Result<Option<ScrollTarget>, String>;

/// Saved positions keyed by history entry, plus the key of the entry the
/// session is currently on.
#[derive(Default)]
pub struct ScrollPositionStore {
    positions: RefCell<HashMap<StateKey, Position>>,
    key: Cell<StateKey>,
}

impl ScrollPositionStore {
    pub fn new() -> Self {
        Self {
            positions: RefCell::new(HashMap::new()),
            key: Cell::new(StateKey::generate()),
        }
    }

    /// Saves `position` under the current entry's key.
    pub fn save(&self, position: Position) {
        self.positions.borrow_mut().insert(self.key.get(), position);
    }

    /// The position saved for the current entry, if any.
    pub fn saved(&self) -> Option<Position> {
        self.positions.borrow().get(&self.key.get()).copied()
    }

    pub fn current_key(&self) -> StateKey {
        self.key.get()
    }

    /// Adopts the key of an entry reached by traversal.
    pub fn set_key(&self, key: StateKey) {
        self.key.set(key);
    }

    /// Generates and adopts a fresh key for a newly pushed entry.
    pub fn rotate_key(&self) -> StateKey {
        let key = StateKey::generate();
        self.key.set(key);
        key
    }
}

/// Resolves a [`ScrollTarget`] to a concrete position via the driver.
///
/// Selector targets that resolve to no element fall back to their
/// coordinate fallback, or to nothing.
pub fn resolve_target(
    target: &ScrollTarget,
    driver: &dyn LocationDriver,
) -> Option<Position> {
    match target {
        ScrollTarget::Position(position) => Some(*position),
        ScrollTarget::Selector { selector, offset, fallback } => {
            match driver.element_position(selector, *offset) {
                Some(position) => Some(position),
                None => *fallback,
            }
        }
    }
}
