//! Deterministic in-memory timer-query backend.
//!
//! Models a GPU that finishes each query a fixed number of ended queries
//! after it was ended, with durations taken from a programmable queue.
//! Used by the test suites and the demo binary; misuse that a real driver
//! would flag (nested begin, end without begin) is reported as an error.

use crate::backend::TimerQueryBackend;
use gpu_timer_common::{TimerError, TimerResult};
use std::collections::VecDeque;

/// Handle to a simulated query object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimQuery(usize);

impl SimQuery {
    /// Index of the query object inside the backend.
    #[must_use]
    pub fn id(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryPhase {
    Idle,
    Active,
    /// Ended; `seq` is the 1-based end order.
    Ended { seq: u64, elapsed_ns: u64 },
}

/// Simulated GPU timer queries.
#[derive(Debug)]
pub struct SimulatedQueries {
    queries: Vec<QueryPhase>,
    active: Option<usize>,
    /// Number of further ends before a query's result is visible.
    latency: u64,
    /// Every query with `seq <= completed_through` is available.
    completed_through: u64,
    durations: VecDeque<u64>,
    default_duration_ns: u64,
    allocation_limit: Option<usize>,
    begin_count: u64,
    end_count: u64,
}

impl Default for SimulatedQueries {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedQueries {
    /// Create a backend whose results are available as soon as a query ends.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queries: Vec::new(),
            active: None,
            latency: 0,
            completed_through: 0,
            durations: VecDeque::new(),
            default_duration_ns: 1_000_000,
            allocation_limit: None,
            begin_count: 0,
            end_count: 0,
        }
    }

    /// Create a backend whose results lag `latency` ended queries behind.
    #[must_use]
    pub fn with_latency(latency: u64) -> Self {
        Self {
            latency,
            ..Self::new()
        }
    }

    /// Set the duration used when the planned queue is empty.
    pub fn set_default_duration_ns(&mut self, ns: u64) {
        self.default_duration_ns = ns;
    }

    /// Queue the duration of the next query to end.
    pub fn push_duration_ns(&mut self, ns: u64) {
        self.durations.push_back(ns);
    }

    /// Queue durations for the next queries to end, in order.
    pub fn push_durations_ns<I: IntoIterator<Item = u64>>(&mut self, durations: I) {
        self.durations.extend(durations);
    }

    /// Cap the total number of query objects that may be allocated.
    pub fn set_allocation_limit(&mut self, limit: Option<usize>) {
        self.allocation_limit = limit;
    }

    /// Complete every ended query, like waiting for the device to go idle.
    pub fn flush(&mut self) {
        self.completed_through = self.end_count;
    }

    /// Total number of `begin` calls.
    #[must_use]
    pub fn begin_count(&self) -> u64 {
        self.begin_count
    }

    /// Total number of `end` calls.
    #[must_use]
    pub fn end_count(&self) -> u64 {
        self.end_count
    }

    /// Number of query objects allocated so far.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.queries.len()
    }

    /// Whether a query is currently measuring.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn phase(&self, query: &SimQuery) -> TimerResult<QueryPhase> {
        self.queries
            .get(query.0)
            .copied()
            .ok_or_else(|| TimerError::Backend(format!("unknown query {}", query.0)))
    }

    fn completed(&self, query: &SimQuery) -> Option<u64> {
        match self.queries.get(query.0) {
            Some(&QueryPhase::Ended { seq, elapsed_ns }) if seq <= self.completed_through => {
                Some(elapsed_ns)
            }
            _ => None,
        }
    }
}

impl TimerQueryBackend for SimulatedQueries {
    type Query = SimQuery;

    fn allocate(&mut self, count: usize) -> TimerResult<Vec<SimQuery>> {
        let start = self.queries.len();
        if let Some(limit) = self.allocation_limit {
            if start + count > limit {
                return Err(TimerError::Backend(format!(
                    "cannot allocate {count} queries: {start} of {limit} in use"
                )));
            }
        }
        self.queries.resize(start + count, QueryPhase::Idle);
        Ok((start..start + count).map(SimQuery).collect())
    }

    fn begin(&mut self, query: &SimQuery) -> TimerResult<()> {
        self.phase(query)?;
        if let Some(active) = self.active {
            return Err(TimerError::Backend(format!(
                "query {} begun while query {active} is active",
                query.0
            )));
        }
        // Restarting an ended query discards its result.
        self.queries[query.0] = QueryPhase::Active;
        self.active = Some(query.0);
        self.begin_count += 1;
        Ok(())
    }

    fn end(&mut self, query: &SimQuery) -> TimerResult<()> {
        if self.phase(query)? != QueryPhase::Active {
            return Err(TimerError::Backend(format!(
                "query {} ended without being active",
                query.0
            )));
        }
        self.end_count += 1;
        let elapsed_ns = self
            .durations
            .pop_front()
            .unwrap_or(self.default_duration_ns);
        self.queries[query.0] = QueryPhase::Ended {
            seq: self.end_count,
            elapsed_ns,
        };
        self.active = None;
        self.completed_through = self
            .completed_through
            .max(self.end_count.saturating_sub(self.latency));
        Ok(())
    }

    fn is_result_available(&mut self, query: &SimQuery) -> bool {
        self.completed(query).is_some()
    }

    fn result_ns(&mut self, query: &SimQuery) -> u64 {
        self.completed(query).unwrap_or(0)
    }
}
