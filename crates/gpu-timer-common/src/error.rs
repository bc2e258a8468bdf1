use thiserror::Error;

/// Timer error types covering registration misuse, ring capacity, and backend failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimerError {
    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Checkpoint name was empty.
    #[error("invalid checkpoint name: {0:?}")]
    InvalidName(String),

    /// A callback is already registered for this ordered pair.
    #[error("callback already registered for {from} -> {to}")]
    DuplicateCallback {
        /// Checkpoint the interval starts at.
        from: String,
        /// Checkpoint the interval ends at.
        to: String,
    },

    /// Every query slot is still awaiting its result.
    #[error("query ring overrun: {pending} of {capacity} slots pending")]
    RingOverrun {
        /// Ring capacity at the time of the overrun.
        capacity: usize,
        /// Number of issued but undrained queries.
        pending: usize,
    },

    /// Timer-query backend failure or misuse.
    #[error("backend error: {0}")]
    Backend(String),

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Source state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

/// Convenience type alias for timer operations.
pub type TimerResult<T> = Result<T, TimerError>;
