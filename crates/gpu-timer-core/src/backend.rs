//! Timer-query backend abstraction.
//!
//! The engine never talks to a graphics API directly. Anything that can
//! bracket GPU work with an elapsed-time query and report the result
//! without blocking can drive it: GL `GL_TIME_ELAPSED` queries, a
//! timestamp-pair emulation, or the [`SimulatedQueries`](crate::SimulatedQueries)
//! model used in tests.

use gpu_timer_common::TimerResult;

/// Asynchronous elapsed-time query facility.
///
/// Implementations must complete queries in the order they were ended.
/// The engine only calls [`result_ns`](Self::result_ns) after
/// [`is_result_available`](Self::is_result_available) returned `true`
/// for the same query.
pub trait TimerQueryBackend {
    /// Handle to one hardware query object.
    type Query;

    /// Create `count` query objects.
    ///
    /// Called once on first use with the configured ring size, and again
    /// when the ring grows.
    fn allocate(&mut self, count: usize) -> TimerResult<Vec<Self::Query>>;

    /// Start measuring on `query`. At most one query is active at a time.
    fn begin(&mut self, query: &Self::Query) -> TimerResult<()>;

    /// Stop measuring on `query`, which must be the active query.
    fn end(&mut self, query: &Self::Query) -> TimerResult<()>;

    /// Non-blocking poll for the result of an ended query.
    fn is_result_available(&mut self, query: &Self::Query) -> bool;

    /// Elapsed GPU time of a completed query in nanoseconds.
    fn result_ns(&mut self, query: &Self::Query) -> u64;
}
