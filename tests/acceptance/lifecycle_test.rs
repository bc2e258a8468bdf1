//! Engine lifecycle and registration acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - The first checkpoint anchors its name at t = 0 without ending a query
//! - Duplicate or malformed registrations are rejected
//! - The accumulated clock is non-decreasing over any checkpoint sequence
//! - Independent engines do not share state

use super::common::{approx_eq, engine, CallLog};
use gpu_timer_common::{EngineState, OverrunPolicy, TimerError};

#[test]
fn test_first_checkpoint_anchors_zero() {
    let mut timer = engine(8, 0, OverrunPolicy::Fault);
    assert_eq!(timer.state(), EngineState::Unstarted);

    timer.checkpoint("start").unwrap();

    assert_eq!(timer.state(), EngineState::Running);
    assert_eq!(timer.last_time("start"), Some(0.0));
    assert_eq!(timer.backend().end_count(), 0);
    assert_eq!(timer.backend().begin_count(), 1);
}

#[test]
fn test_duplicate_registration_rejected() {
    let log = CallLog::new();
    let mut timer = engine(8, 0, OverrunPolicy::Fault);

    timer.add_callback("A", "B", log.callback()).unwrap();
    let err = timer.add_callback("A", "B", log.callback()).unwrap_err();
    assert_eq!(
        err,
        TimerError::DuplicateCallback {
            from: "A".into(),
            to: "B".into()
        }
    );

    // The original registration still works, exactly once per span
    timer.checkpoint("A").unwrap();
    timer.checkpoint("B").unwrap();
    assert_eq!(log.len(), 1);
}

#[test]
fn test_empty_names_rejected() {
    let log = CallLog::new();
    let mut timer = engine(8, 0, OverrunPolicy::Fault);

    assert!(matches!(
        timer.add_callback("", "B", log.callback()),
        Err(TimerError::InvalidName(_))
    ));
    assert!(matches!(
        timer.checkpoint(""),
        Err(TimerError::InvalidName(_))
    ));
    assert_eq!(timer.state(), EngineState::Unstarted);
}

#[test]
fn test_accumulator_non_decreasing() {
    let mut timer = engine(8, 3, OverrunPolicy::Grow);
    timer
        .backend_mut()
        .push_durations_ns((1..=300u64).map(|i| (i * 104_729) % 2_500_000));

    let names = ["frame", "gbuffer", "lighting", "frame", "ui", "present"];
    let mut previous = 0.0;
    for i in 0..300 {
        timer.checkpoint(names[i % names.len()]).unwrap();
        let now = timer.total_time();
        assert!(now >= previous);
        previous = now;
    }
    assert!(previous > 0.0);
}

#[test]
fn test_engines_are_independent() {
    let first_log = CallLog::new();
    let mut first = engine(8, 0, OverrunPolicy::Fault);
    let mut second = engine(8, 0, OverrunPolicy::Fault);
    first.add_callback("A", "B", first_log.callback()).unwrap();

    first.checkpoint("A").unwrap();
    first.checkpoint("B").unwrap();
    second.checkpoint("B").unwrap();

    assert_eq!(first_log.len(), 1);
    assert!(!second.has_callback("A", "B"));
    assert_eq!(second.last_time("B"), Some(0.0));
    assert!(second.last_time("A").is_none());
}

#[test]
fn test_reset_recovers_from_fault() {
    let log = CallLog::new();
    let mut timer = engine(2, u64::MAX, OverrunPolicy::Fault);
    timer.add_callback("A", "B", log.callback()).unwrap();

    for name in ["A", "B"] {
        timer.checkpoint(name).unwrap();
    }
    assert!(timer.checkpoint("C").is_err());
    assert_eq!(timer.state(), EngineState::Faulted);

    timer.reset().unwrap();
    assert_eq!(timer.state(), EngineState::Unstarted);
    assert_eq!(timer.total_time(), 0.0);

    // Registrations survive the reset
    timer.backend_mut().flush();
    timer.checkpoint("A").unwrap();
    assert!(timer.has_callback("A", "B"));
    assert_eq!(log.len(), 0);
}

#[test]
fn test_reset_recovers_from_backend_failure() {
    let log = CallLog::new();
    let mut timer = engine(2, u64::MAX, OverrunPolicy::Grow);
    timer.backend_mut().set_allocation_limit(Some(2));
    timer.add_callback("A", "B", log.callback()).unwrap();

    timer.checkpoint("A").unwrap();
    timer.checkpoint("B").unwrap();
    // The ring is full and the backend refuses to grow it
    assert!(matches!(
        timer.checkpoint("C"),
        Err(TimerError::Backend(_))
    ));
    assert_eq!(timer.state(), EngineState::Faulted);

    timer.reset().unwrap();
    timer.backend_mut().set_allocation_limit(None);
    timer.backend_mut().set_default_duration_ns(2_000_000);
    timer.backend_mut().flush();

    timer.checkpoint("A").unwrap();
    timer.checkpoint("B").unwrap();
    timer.backend_mut().flush();
    timer.checkpoint("C").unwrap();

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert!(approx_eq(entries[0].interval, 0.002));
}
