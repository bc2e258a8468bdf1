//! Query ring capacity acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Up to N consecutive checkpoints never lose timing data, however late
//!   the GPU delivers results
//! - An overrun is surfaced according to the configured policy, never
//!   silently corrupting correlation

use super::common::{engine, CallLog};
use gpu_timer_common::{EngineState, OverrunPolicy, TimerError};

const SLOTS: usize = 4;

#[test]
fn test_n_names_without_drain_keep_all_data() {
    let mut timer = engine(SLOTS, u64::MAX, OverrunPolicy::Fault);
    let names: Vec<String> = (0..SLOTS).map(|i| format!("pass{i}")).collect();

    for name in &names {
        let outcome = timer.checkpoint(name).unwrap();
        assert_eq!(outcome.drained, 0);
    }
    assert_eq!(timer.pending(), SLOTS - 1);

    // GPU catches up; the next checkpoint drains everything outstanding
    timer.backend_mut().flush();
    let outcome = timer.checkpoint(&names[0]).unwrap();
    assert_eq!(outcome.drained, SLOTS - 1);

    for name in &names {
        assert!(timer.last_time(name).is_some(), "lost timing for {name}");
    }
    assert_eq!(timer.capacity(), SLOTS);
    assert_eq!(timer.snapshot().dropped_queries, 0);
}

#[test]
fn test_overrun_faults_under_fault_policy() {
    let mut timer = engine(SLOTS, u64::MAX, OverrunPolicy::Fault);

    for i in 0..SLOTS {
        timer.checkpoint(&format!("pass{i}")).unwrap();
    }
    let err = timer.checkpoint("one_too_many").unwrap_err();
    assert_eq!(
        err,
        TimerError::RingOverrun {
            capacity: SLOTS,
            pending: SLOTS
        }
    );
    assert_eq!(timer.state(), EngineState::Faulted);
}

#[test]
fn test_overrun_grows_under_grow_policy() {
    let log = CallLog::new();
    let mut timer = engine(SLOTS, u64::MAX, OverrunPolicy::Grow);
    timer.add_callback("pass0", "pass9", log.callback()).unwrap();

    for i in 0..10 {
        timer.checkpoint(&format!("pass{i}")).unwrap();
    }
    assert!(timer.capacity() >= 10);

    timer.backend_mut().flush();
    timer.checkpoint("pass0").unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(timer.snapshot().dropped_queries, 0);
}

#[test]
fn test_overrun_counts_drops_under_overwrite_policy() {
    let mut timer = engine(SLOTS, u64::MAX, OverrunPolicy::Overwrite);

    for i in 0..SLOTS + 3 {
        timer.checkpoint(&format!("pass{i}")).unwrap();
    }

    let snapshot = timer.snapshot();
    assert_eq!(snapshot.capacity, SLOTS);
    assert_eq!(snapshot.dropped_queries, 3);
    assert_eq!(snapshot.state, EngineState::Running);
}
