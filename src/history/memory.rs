//! In-process history: a driverless adapter and a test-friendly driver.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::RouterError;
use crate::history::{GoOutcome, LocationAdapter, LocationDriver, RouterMode};
use crate::scroll::{Position, ScrollPositionStore, StateKey};

/// History as a plain stack, with no environment behind it. Used where no
/// driver exists (servers, tests, embedded hosts).
pub struct MemoryAdapter {
    stack: RefCell<Vec<String>>,
    /// Current position; -1 before the first navigation commits.
    index: Cell<isize>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
            index: Cell::new(-1),
        }
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationAdapter for MemoryAdapter {
    fn mode(&self) -> RouterMode {
        RouterMode::Memory
    }

    fn current_location(&self) -> String {
        let index = self.index.get();
        if index < 0 {
            "/".to_string()
        } else {
            self.stack.borrow()[index as usize].clone()
        }
    }

    fn apply(&self, full_path: &str, replace: bool, _store: &ScrollPositionStore) {
        let mut stack = self.stack.borrow_mut();
        let index = self.index.get();
        if replace && index >= 0 {
            stack[index as usize] = full_path.to_string();
        } else {
            // A push from mid-stack discards the forward entries.
            stack.truncate((index + 1) as usize);
            stack.push(full_path.to_string());
            self.index.set(index + 1);
        }
    }

    fn ensure(&self, _full_path: &str, _push: bool, _store: &ScrollPositionStore) {}

    fn go(&self, delta: i64) -> GoOutcome {
        let target = self.index.get() + delta as isize;
        if target < 0 || target >= self.stack.borrow().len() as isize {
            return GoOutcome::Ignored;
        }
        GoOutcome::Resolve {
            location: self.stack.borrow()[target as usize].clone(),
            index: target,
        }
    }

    fn finish_go(&self, index: isize) {
        self.index.set(index);
    }

    fn driver(&self) -> Option<Rc<dyn LocationDriver>> {
        None
    }
}

/// A [`LocationDriver`] over an in-memory entry list. Behaves like a real
/// history stack (pushes truncate forward entries, traversal is silent)
/// so adapter and coordinator behavior can be exercised without a host.
pub struct MemoryDriver {
    entries: RefCell<Vec<(StateKey, String)>>,
    index: Cell<usize>,
    scroll: Cell<Position>,
    supports_push: bool,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::with_url("/")
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            entries: RefCell::new(vec![(StateKey::generate(), url.to_string())]),
            index: Cell::new(0),
            scroll: Cell::new(Position::default()),
            supports_push: true,
        }
    }

    /// A driver that refuses structured entries, for exercising mode
    /// fallback and full-load writes.
    pub fn without_push_state(url: &str) -> Self {
        Self {
            supports_push: false,
            ..Self::with_url(url)
        }
    }

    pub fn set_scroll(&self, position: Position) {
        self.scroll.set(position);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationDriver for MemoryDriver {
    fn url(&self) -> String {
        self.entries.borrow()[self.index.get()].1.clone()
    }

    fn push_state(&self, key: StateKey, url: &str) -> Result<(), RouterError> {
        if !self.supports_push {
            return Err(RouterError::DriverWrite("push_state unsupported".to_string()));
        }
        let mut entries = self.entries.borrow_mut();
        entries.truncate(self.index.get() + 1);
        entries.push((key, url.to_string()));
        self.index.set(self.index.get() + 1);
        Ok(())
    }

    fn replace_state(&self, key: StateKey, url: &str) -> Result<(), RouterError> {
        if !self.supports_push {
            return Err(RouterError::DriverWrite("replace_state unsupported".to_string()));
        }
        self.entries.borrow_mut()[self.index.get()] = (key, url.to_string());
        Ok(())
    }

    fn assign(&self, url: &str) {
        // A full load carries no state key.
        let mut entries = self.entries.borrow_mut();
        entries.truncate(self.index.get() + 1);
        entries.push((StateKey::default(), url.to_string()));
        self.index.set(self.index.get() + 1);
    }

    fn replace(&self, url: &str) {
        self.entries.borrow_mut()[self.index.get()] = (StateKey::default(), url.to_string());
    }

    fn go(&self, delta: i64) {
        let target = self.index.get() as i64 + delta;
        if target >= 0 && (target as usize) < self.entries.borrow().len() {
            self.index.set(target as usize);
        }
    }

    fn supports_push_state(&self) -> bool {
        self.supports_push
    }

    fn state_key(&self) -> Option<StateKey> {
        let key = self.entries.borrow()[self.index.get()].0;
        (key != StateKey::default()).then_some(key)
    }

    fn scroll_offset(&self) -> Position {
        self.scroll.get()
    }

    fn scroll_to(&self, position: Position) {
        self.scroll.set(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_adapter_stack() {
        let adapter = MemoryAdapter::new();
        let store = ScrollPositionStore::new();
        assert_eq!(adapter.current_location(), "/");

        adapter.apply("/a", false, &store);
        adapter.apply("/b", false, &store);
        assert_eq!(adapter.current_location(), "/b");

        match adapter.go(-1) {
            GoOutcome::Resolve { location, index } => {
                assert_eq!(location, "/a");
                adapter.finish_go(index);
            }
            _ => panic!("expected in-range traversal to resolve"),
        }
        assert_eq!(adapter.current_location(), "/a");

        // Pushing from mid-stack drops the forward entry.
        adapter.apply("/c", false, &store);
        assert!(matches!(adapter.go(1), GoOutcome::Ignored));
    }

    #[test]
    fn test_memory_adapter_out_of_range_go_is_ignored() {
        let adapter = MemoryAdapter::new();
        assert!(matches!(adapter.go(-1), GoOutcome::Ignored));
        assert!(matches!(adapter.go(1), GoOutcome::Ignored));
    }

    #[test]
    fn test_memory_adapter_replace_keeps_index() {
        let adapter = MemoryAdapter::new();
        let store = ScrollPositionStore::new();
        adapter.apply("/a", false, &store);
        adapter.apply("/b", true, &store);
        assert_eq!(adapter.current_location(), "/b");
        assert!(matches!(adapter.go(-1), GoOutcome::Ignored));
    }

    #[test]
    fn test_memory_driver_push_truncates_forward() {
        let driver = MemoryDriver::new();
        driver.push_state(StateKey::generate(), "/a").unwrap();
        driver.push_state(StateKey::generate(), "/b").unwrap();
        driver.go(-1);
        assert_eq!(driver.url(), "/a");
        driver.push_state(StateKey::generate(), "/c").unwrap();
        assert_eq!(driver.entry_count(), 3);
        driver.go(1);
        assert_eq!(driver.url(), "/c");
    }

    #[test]
    fn test_memory_driver_without_push_state() {
        let driver = MemoryDriver::without_push_state("/");
        assert!(driver.push_state(StateKey::generate(), "/a").is_err());
        driver.assign("/a");
        assert_eq!(driver.url(), "/a");
        assert_eq!(driver.state_key(), None);
    }
}
