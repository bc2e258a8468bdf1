//! Checkpoint dispatcher.
//!
//! [`GpuTimer::checkpoint`] is the single per-iteration entry point. Every
//! call performs, in order:
//! 1. End the query opened at the previous checkpoint and tag it with this
//!    checkpoint's name (the very first call instead records time zero).
//! 2. Drain every result the backend already has, oldest first: advance the
//!    accumulated GPU time, fire the callbacks ending at the drained name,
//!    then update that name in the ledger.
//! 3. Begin a new query for the interval starting here.
//!
//! Nothing waits on the GPU. A result that is not ready yet is simply
//! picked up by a later checkpoint.

use crate::backend::TimerQueryBackend;
use crate::ledger::CheckpointLedger;
use crate::registry::{CallbackRegistry, IntervalCallback, Registration};
use crate::ring::QueryRing;
use gpu_timer_common::config::{
    OverrunPolicy, TimerConfig, DEFAULT_MAX_QUERY_SLOTS, DEFAULT_QUERY_SLOTS,
};
use gpu_timer_common::error::{TimerError, TimerResult};
use gpu_timer_common::metrics::IntervalMetrics;
use gpu_timer_common::state::EngineState;
use serde::Serialize;
use static_assertions::const_assert;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, info, trace, warn};

const_assert!(DEFAULT_QUERY_SLOTS >= 1);
const_assert!(DEFAULT_QUERY_SLOTS <= DEFAULT_MAX_QUERY_SLOTS);

const NANOS_PER_SEC: f64 = 1e9;

/// Interval metrics fed by a tracked edge.
pub type SharedIntervalMetrics = Rc<RefCell<IntervalMetrics>>;

/// Result of a single checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckpointOutcome {
    /// Query results folded into the accumulator during this call.
    pub drained: usize,
    /// Callbacks invoked during this call.
    pub callbacks_fired: usize,
    /// Ended queries still awaiting their result.
    pub pending: usize,
}

/// Point-in-time view of the engine for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TimerSnapshot {
    /// Lifecycle state.
    pub state: EngineState,
    /// Accumulated GPU time in seconds.
    pub total_time_s: f64,
    /// Current ring capacity (0 before first use).
    pub capacity: usize,
    /// Ended queries awaiting their result.
    pub pending: usize,
    /// Checkpoints accepted since creation.
    pub checkpoints: u64,
    /// Query results drained since creation.
    pub drained_queries: u64,
    /// Results discarded by the overwrite policy since creation.
    pub dropped_queries: u64,
    /// Distinct checkpoint names in the ledger.
    pub ledger_entries: usize,
    /// Registered callback edges.
    pub callback_edges: usize,
}

/// Asynchronous GPU checkpoint timer.
///
/// Owns the query ring, the checkpoint ledger, and the callback registry.
/// Not thread-safe; calls must be serialized by the owner.
pub struct GpuTimer<B: TimerQueryBackend> {
    backend: B,
    config: TimerConfig,
    state: EngineState,
    /// Empty until first use.
    ring: QueryRing<B::Query>,
    ledger: CheckpointLedger,
    registry: CallbackRegistry,
    /// Accumulated GPU time in seconds; only grows.
    total_time: f64,
    checkpoints: u64,
    drained_queries: u64,
    dropped_queries: u64,
}

impl<B: TimerQueryBackend> GpuTimer<B> {
    /// Create a timer over `backend`.
    ///
    /// No query objects are allocated until the first
    /// [`add_callback`](Self::add_callback) or [`checkpoint`](Self::checkpoint).
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Config`] if the configuration is invalid.
    pub fn new(backend: B, config: TimerConfig) -> TimerResult<Self> {
        config
            .validate()
            .map_err(|e| TimerError::Config(e.to_string()))?;
        Ok(Self::build(backend, config))
    }

    /// Create a timer with default configuration.
    pub fn with_defaults(backend: B) -> Self {
        Self::build(backend, TimerConfig::default())
    }

    fn build(backend: B, config: TimerConfig) -> Self {
        Self {
            backend,
            config,
            state: EngineState::Unstarted,
            ring: QueryRing::default(),
            ledger: CheckpointLedger::new(),
            registry: CallbackRegistry::new(),
            total_time: 0.0,
            checkpoints: 0,
            drained_queries: 0,
            dropped_queries: 0,
        }
    }

    /// Register `callback` for the interval from checkpoint `from` to `to`.
    ///
    /// The callback fires each time a query ending at `to` is drained and
    /// `from` has been reached at least once, receiving
    /// `(from, to, seconds)`. `from == to` measures the time between
    /// consecutive visits.
    ///
    /// # Errors
    ///
    /// - [`TimerError::InvalidName`] if either name is empty.
    /// - [`TimerError::DuplicateCallback`] if the pair is already registered;
    ///   the existing callback is kept.
    pub fn add_callback<F>(&mut self, from: &str, to: &str, callback: F) -> TimerResult<()>
    where
        F: FnMut(&str, &str, f64) + 'static,
    {
        self.register(from, to, Box::new(callback))
    }

    /// Register a built-in callback that feeds interval metrics for `(from, to)`.
    ///
    /// The histogram is sized and budgeted from the engine's metrics config.
    ///
    /// # Errors
    ///
    /// Same as [`add_callback`](Self::add_callback).
    pub fn track(&mut self, from: &str, to: &str) -> TimerResult<SharedIntervalMetrics> {
        let metrics = Rc::new(RefCell::new(IntervalMetrics::new(
            self.config.metrics.histogram_size,
            self.config.metrics.budget,
        )));
        let sink = Rc::clone(&metrics);
        self.register(
            from,
            to,
            Box::new(move |_: &str, _: &str, seconds: f64| {
                sink.borrow_mut().record_secs(seconds);
            }),
        )?;
        Ok(metrics)
    }

    fn register(&mut self, from: &str, to: &str, callback: IntervalCallback) -> TimerResult<()> {
        validate_name(from)?;
        validate_name(to)?;
        self.ensure_initialized()?;

        match self.registry.insert(from, to, callback) {
            Registration::Inserted => {
                debug!(from, to, "Registered interval callback");
                Ok(())
            }
            Registration::AlreadyPresent => Err(TimerError::DuplicateCallback {
                from: from.to_owned(),
                to: to.to_owned(),
            }),
        }
    }

    /// Mark checkpoint `name` in the GPU timeline.
    ///
    /// Ends the previous interval, drains ready results, and begins the next
    /// interval. Never blocks on the GPU.
    ///
    /// # Errors
    ///
    /// - [`TimerError::InvalidName`] if `name` is empty.
    /// - [`TimerError::InvalidStateTransition`] if the engine is faulted.
    /// - [`TimerError::RingOverrun`] if every slot is pending and the
    ///   overrun policy cannot make room; the engine is then faulted.
    /// - [`TimerError::Backend`] if the backend rejects a call. A failure
    ///   to grow the ring or begin the next query also faults the engine.
    pub fn checkpoint(&mut self, name: &str) -> TimerResult<CheckpointOutcome> {
        validate_name(name)?;
        if self.state == EngineState::Faulted {
            return Err(TimerError::InvalidStateTransition {
                from: self.state.to_string(),
                to: EngineState::Running.to_string(),
            });
        }
        self.ensure_initialized()?;
        self.checkpoints += 1;

        // 1. Close the interval opened at the previous checkpoint
        self.end_current(name)?;

        // 2. Fold in whatever the GPU has finished
        let (drained, callbacks_fired) = self.drain_ready();

        // 3. Open the interval starting here
        self.begin_next()?;

        Ok(CheckpointOutcome {
            drained,
            callbacks_fired,
            pending: self.ring.pending(),
        })
    }

    /// Return to the unstarted state.
    ///
    /// The ledger and accumulated time are cleared and the ring cursors
    /// rewound; registered callbacks, allocated queries, and lifetime
    /// counters are kept. Any results still in flight are abandoned. This
    /// is the only way out of the faulted state.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Backend`] if ending the active query fails.
    pub fn reset(&mut self) -> TimerResult<()> {
        if self.ring.is_active() {
            self.ring.abandon_current(&mut self.backend)?;
        }
        if self.state != EngineState::Unstarted {
            self.state.transition_to(EngineState::Unstarted)?;
        }

        let abandoned = self.ring.pending();
        self.ring.reset();
        self.ledger.clear();
        self.total_time = 0.0;
        info!(abandoned, "Timer reset");
        Ok(())
    }

    fn ensure_initialized(&mut self) -> TimerResult<()> {
        if self.ring.capacity() > 0 {
            return Ok(());
        }

        let slots = self.config.query_slots;
        let queries = self.allocate(slots)?;
        self.ring = QueryRing::new(queries);
        info!(slots, "Timer queries allocated");
        Ok(())
    }

    fn allocate(&mut self, count: usize) -> TimerResult<Vec<B::Query>> {
        let queries = self.backend.allocate(count)?;
        if queries.len() != count {
            return Err(TimerError::Backend(format!(
                "requested {count} queries, backend returned {}",
                queries.len()
            )));
        }
        Ok(queries)
    }

    fn end_current(&mut self, name: &str) -> TimerResult<()> {
        if self.state == EngineState::Unstarted {
            // First checkpoint: nothing is running yet, so this name anchors t = 0.
            self.ledger.record_time(name, 0.0);
            self.state.transition_to(EngineState::Running)?;
            debug!(name, "Timeline started");
            return Ok(());
        }
        self.ring.end_current(&mut self.backend, name)
    }

    fn drain_ready(&mut self) -> (usize, usize) {
        let mut drained = 0;
        let mut fired = 0;

        while let Some(ready) = self.ring.pop_ready(&mut self.backend) {
            self.total_time += ready.elapsed_ns as f64 / NANOS_PER_SEC;
            fired += self
                .registry
                .resolve(&ready.checkpoint, self.total_time, &self.ledger);
            self.ledger.record_time(&ready.checkpoint, self.total_time);
            trace!(
                name = %ready.checkpoint,
                slot = ready.slot,
                elapsed_ns = ready.elapsed_ns,
                total_s = self.total_time,
                "Drained query"
            );
            drained += 1;
        }

        self.drained_queries += drained as u64;
        (drained, fired)
    }

    fn begin_next(&mut self) -> TimerResult<()> {
        if self.ring.is_full() {
            self.make_room()?;
        }
        if let Err(e) = self.ring.begin_next(&mut self.backend) {
            return Err(self.fault(e));
        }
        Ok(())
    }

    /// Enter the faulted state with no query open and hand back `err`.
    fn fault(&mut self, err: TimerError) -> TimerError {
        error!(error = %err, "Timer faulted");
        match self.state.transition_to(EngineState::Faulted) {
            Ok(()) => err,
            Err(transition) => transition,
        }
    }

    fn make_room(&mut self) -> TimerResult<()> {
        let capacity = self.ring.capacity();
        let pending = self.ring.pending();
        let max = self.config.max_query_slots;

        match self.config.overrun {
            OverrunPolicy::Grow if capacity < max => {
                let extra = capacity.min(max - capacity);
                let queries = self.allocate(extra).map_err(|e| self.fault(e))?;
                self.ring.grow(queries);
                warn!(
                    from = capacity,
                    to = self.ring.capacity(),
                    "Query ring full, growing"
                );
                Ok(())
            }
            OverrunPolicy::Grow | OverrunPolicy::Fault => {
                Err(self.fault(TimerError::RingOverrun { capacity, pending }))
            }
            OverrunPolicy::Overwrite => {
                let dropped = self.ring.discard_oldest();
                self.dropped_queries += 1;
                warn!(
                    capacity,
                    dropped = dropped.as_deref().unwrap_or_default(),
                    "Query ring full, discarding oldest result"
                );
                Ok(())
            }
        }
    }

    /// Lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Accumulated GPU time in seconds over all drained queries.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Last accumulated time recorded for checkpoint `name`.
    pub fn last_time(&self, name: &str) -> Option<f64> {
        self.ledger.lookup(name)
    }

    /// Read-only view of the checkpoint ledger.
    pub fn ledger(&self) -> &CheckpointLedger {
        &self.ledger
    }

    /// Whether a callback is registered for `(from, to)`.
    pub fn has_callback(&self, from: &str, to: &str) -> bool {
        self.registry.contains(from, to)
    }

    /// Current ring capacity; zero before first use.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Ended queries awaiting their result.
    pub fn pending(&self) -> usize {
        self.ring.pending()
    }

    /// Engine configuration.
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Shared access to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend, e.g. to wait for the device.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Get a snapshot of the engine counters.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            total_time_s: self.total_time,
            capacity: self.ring.capacity(),
            pending: self.ring.pending(),
            checkpoints: self.checkpoints,
            drained_queries: self.drained_queries,
            dropped_queries: self.dropped_queries,
            ledger_entries: self.ledger.len(),
            callback_edges: self.registry.len(),
        }
    }
}

fn validate_name(name: &str) -> TimerResult<()> {
    if name.is_empty() {
        return Err(TimerError::InvalidName(name.to_owned()));
    }
    Ok(())
}
