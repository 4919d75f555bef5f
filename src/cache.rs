//! Compute-once memo shared by concurrent workers.
//!
//! Several photo pages can reference the same source image. The first worker
//! to ask for a key runs the computation; every other worker asking for the
//! same key while it runs blocks on the same [`OnceCell`] and receives the
//! same value. Different keys never wait on each other.
//!
//! Failed computations are not memoized: the cell stays empty and the next
//! caller tries again.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Per-key single-flight memo.
#[derive(Debug)]
pub struct SingleFlight<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> SingleFlight<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized value for `key`, computing it with `init` if this
    /// is the first successful request.
    pub fn get_or_try_init<E>(
        &self,
        key: &K,
        init: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        // The map lock is only held to fetch the cell, never during `init`.
        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(cells.entry(key.clone()).or_default())
        };
        cell.get_or_try_init(init).cloned()
    }

    /// Value for `key` if one has been computed.
    #[cfg(test)]
    pub fn get(&self, key: &K) -> Option<V> {
        let cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of keys with a computed value.
    pub fn len(&self) -> usize {
        let cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells.values().filter(|cell| cell.get().is_some()).count()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
