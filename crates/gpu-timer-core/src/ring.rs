//! Ring buffer of in-flight timer queries.
//!
//! Each slot owns one backend query and the name of the checkpoint that
//! closed it. Slots between `read_index` and `write_index` (with `pending`
//! disambiguating full from empty) hold ended queries whose results have
//! not been drained yet. The slot at `write_index` is the one measuring
//! the current interval.

use crate::backend::TimerQueryBackend;
use gpu_timer_common::TimerResult;
use tracing::trace;

/// One query object and the checkpoint that ended it.
#[derive(Debug)]
pub struct TimerSlot<Q> {
    query: Q,
    checkpoint: Option<String>,
}

impl<Q> TimerSlot<Q> {
    fn new(query: Q) -> Self {
        Self {
            query,
            checkpoint: None,
        }
    }

    /// Name of the checkpoint whose result this slot is waiting for.
    #[must_use]
    pub fn checkpoint(&self) -> Option<&str> {
        self.checkpoint.as_deref()
    }
}

/// A drained query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyQuery {
    /// Slot index the result was read from.
    pub slot: usize,
    /// Checkpoint that ended the query.
    pub checkpoint: String,
    /// Elapsed GPU time in nanoseconds.
    pub elapsed_ns: u64,
}

/// Fixed-capacity ring of timer queries with read/write cursors.
#[derive(Debug)]
pub struct QueryRing<Q> {
    slots: Vec<TimerSlot<Q>>,
    /// Slot measuring the current interval.
    write_index: usize,
    /// Oldest ended slot awaiting its result.
    read_index: usize,
    /// Number of ended, undrained slots.
    pending: usize,
    /// Whether the slot at `write_index` has a query begun on it.
    active: bool,
}

impl<Q> Default for QueryRing<Q> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            write_index: 0,
            read_index: 0,
            pending: 0,
            active: false,
        }
    }
}

impl<Q> QueryRing<Q> {
    /// Build a ring over freshly allocated queries.
    #[must_use]
    pub fn new(queries: Vec<Q>) -> Self {
        Self {
            slots: queries.into_iter().map(TimerSlot::new).collect(),
            ..Self::default()
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of ended queries not yet drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// True when no free slot is left for the next interval.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.pending == self.slots.len()
    }

    /// Whether a query is currently measuring.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Slot that will be (or is being) measured.
    #[must_use]
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// Oldest slot awaiting drain.
    #[must_use]
    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Slot at `index`, if in range.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&TimerSlot<Q>> {
        self.slots.get(index)
    }

    /// End the query measuring the current interval and tag it with `name`.
    pub fn end_current<B>(&mut self, backend: &mut B, name: &str) -> TimerResult<()>
    where
        B: TimerQueryBackend<Query = Q>,
    {
        let slot = &mut self.slots[self.write_index];
        backend.end(&slot.query)?;
        slot.checkpoint = Some(name.to_owned());
        self.active = false;
        trace!(slot = self.write_index, name, "Ended query");

        self.write_index = (self.write_index + 1) % self.slots.len();
        self.pending += 1;
        Ok(())
    }

    /// Begin measuring the next interval on the slot at `write_index`.
    ///
    /// The caller must make room first if the ring [`is_full`](Self::is_full).
    pub fn begin_next<B>(&mut self, backend: &mut B) -> TimerResult<()>
    where
        B: TimerQueryBackend<Query = Q>,
    {
        debug_assert!(!self.is_full(), "beginning a query on a pending slot");
        backend.begin(&self.slots[self.write_index].query)?;
        self.active = true;
        Ok(())
    }

    /// End the current query without tagging it, so no result is expected.
    pub fn abandon_current<B>(&mut self, backend: &mut B) -> TimerResult<()>
    where
        B: TimerQueryBackend<Query = Q>,
    {
        backend.end(&self.slots[self.write_index].query)?;
        self.active = false;
        Ok(())
    }

    /// Take the oldest result if the backend has it ready.
    ///
    /// Returns `None` when nothing is pending or the oldest query is still
    /// in flight; later queries are never read ahead of it.
    pub fn pop_ready<B>(&mut self, backend: &mut B) -> Option<ReadyQuery>
    where
        B: TimerQueryBackend<Query = Q>,
    {
        if self.pending == 0 {
            return None;
        }

        let index = self.read_index;
        let slot = &mut self.slots[index];
        if !backend.is_result_available(&slot.query) {
            return None;
        }

        let elapsed_ns = backend.result_ns(&slot.query);
        let checkpoint = slot.checkpoint.take().unwrap_or_default();
        self.read_index = (self.read_index + 1) % self.slots.len();
        self.pending -= 1;

        Some(ReadyQuery {
            slot: index,
            checkpoint,
            elapsed_ns,
        })
    }

    /// Forget the oldest pending result, returning its checkpoint name.
    pub fn discard_oldest(&mut self) -> Option<String> {
        if self.pending == 0 {
            return None;
        }
        let name = self.slots[self.read_index].checkpoint.take();
        self.read_index = (self.read_index + 1) % self.slots.len();
        self.pending -= 1;
        name
    }

    /// Splice fresh queries in at `write_index`.
    ///
    /// Pending slots keep their relative order, so in-order draining is
    /// preserved across growth.
    pub fn grow(&mut self, queries: Vec<Q>) {
        let added = queries.len();
        if self.pending > 0 && self.read_index >= self.write_index {
            self.read_index += added;
        }
        let at = self.write_index;
        self.slots
            .splice(at..at, queries.into_iter().map(TimerSlot::new));
    }

    /// Return both cursors to slot 0 and drop every tag.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.checkpoint = None;
        }
        self.write_index = 0;
        self.read_index = 0;
        self.pending = 0;
        self.active = false;
    }
}
