//! Interval callbacks keyed by checkpoint pairs.
//!
//! Callbacks are stored under the checkpoint that closes the interval, so a
//! drained query only has to look up its own name to find every edge that
//! ends there.

use crate::ledger::CheckpointLedger;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Callback receiving `(from, to, interval_seconds)`.
pub type IntervalCallback = Box<dyn FnMut(&str, &str, f64)>;

/// Outcome of [`CallbackRegistry::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Registration {
    /// The pair was new and the callback was stored.
    Inserted,
    /// The pair already had a callback; the new one was dropped.
    AlreadyPresent,
}

/// Map from `to` checkpoint to `from` checkpoint to callback.
#[derive(Default)]
pub struct CallbackRegistry {
    edges: HashMap<String, BTreeMap<String, IntervalCallback>>,
    edge_count: usize,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (to, froms) in &self.edges {
            map.entry(to, &froms.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

impl CallbackRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `callback` for `(from, to)` unless the pair is already taken.
    pub fn insert(&mut self, from: &str, to: &str, callback: IntervalCallback) -> Registration {
        let froms = self.edges.entry(to.to_owned()).or_default();
        match froms.entry(from.to_owned()) {
            Entry::Occupied(_) => Registration::AlreadyPresent,
            Entry::Vacant(slot) => {
                slot.insert(callback);
                self.edge_count += 1;
                Registration::Inserted
            }
        }
    }

    /// Whether a callback exists for `(from, to)`.
    #[must_use]
    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.edges
            .get(to)
            .is_some_and(|froms| froms.contains_key(from))
    }

    /// Number of registered edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edge_count
    }

    /// Returns true if no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    /// Fire every callback ending at `to`.
    ///
    /// Each callback receives `accumulated - ledger[from]`. Edges whose
    /// `from` checkpoint has never been recorded are skipped. Callbacks run
    /// in `from` name order. Returns the number of callbacks invoked.
    pub fn resolve(&mut self, to: &str, accumulated: f64, ledger: &CheckpointLedger) -> usize {
        let Some(froms) = self.edges.get_mut(to) else {
            return 0;
        };

        let mut fired = 0;
        for (from, callback) in froms.iter_mut() {
            if let Some(from_time) = ledger.lookup(from) {
                callback(from.as_str(), to, accumulated - from_time);
                fired += 1;
            }
        }
        fired
    }
}
