//! Last-seen time per checkpoint name.
//!
//! Times are absolute positions on the engine's accumulated GPU clock, in
//! seconds. Entries are created on first sight and never removed; the set
//! of checkpoint names in a frame loop is small and fixed.

use std::collections::HashMap;

/// Map from checkpoint name to the accumulated time it was last reached.
#[derive(Debug, Default, Clone)]
pub struct CheckpointLedger {
    times: HashMap<String, f64>,
}

impl CheckpointLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `time` for `name`, overwriting any previous value.
    ///
    /// Only the first sighting of a name allocates.
    pub fn record_time(&mut self, name: &str, time: f64) {
        if let Some(slot) = self.times.get_mut(name) {
            *slot = time;
        } else {
            self.times.insert(name.to_owned(), time);
        }
    }

    /// Last recorded time for `name`, if it was ever recorded.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<f64> {
        self.times.get(name).copied()
    }

    /// Number of distinct checkpoint names recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterate over `(name, time)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.times.iter().map(|(name, &time)| (name.as_str(), time))
    }

    pub(crate) fn clear(&mut self) {
        self.times.clear();
    }
}
