//! Common utilities for acceptance tests.
//!
//! Provides helpers for:
//! - Recording callback invocations
//! - Building engines with a given ring size, latency, and overrun policy

#![allow(dead_code)] // Not every scenario uses every helper

use gpu_timer_common::{OverrunPolicy, TimerConfig};
use gpu_timer_core::{GpuTimer, SimulatedQueries};
use std::cell::RefCell;
use std::rc::Rc;

/// A single recorded callback invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Checkpoint the interval started at.
    pub from: String,
    /// Checkpoint the interval ended at.
    pub to: String,
    /// Measured interval in seconds.
    pub interval: f64,
}

/// Shared log of callback invocations.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Invocation>>>);

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback that appends to this log.
    pub fn callback(&self) -> impl FnMut(&str, &str, f64) + 'static {
        let log = Rc::clone(&self.0);
        move |from: &str, to: &str, interval: f64| {
            log.borrow_mut().push(Invocation {
                from: from.to_owned(),
                to: to.to_owned(),
                interval,
            });
        }
    }

    /// Number of recorded invocations.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Copy of every recorded invocation.
    pub fn entries(&self) -> Vec<Invocation> {
        self.0.borrow().clone()
    }
}

/// Build an engine over the simulated backend.
pub fn engine(slots: usize, latency: u64, overrun: OverrunPolicy) -> GpuTimer<SimulatedQueries> {
    let config = TimerConfig {
        query_slots: slots,
        max_query_slots: slots.max(64),
        overrun,
        ..TimerConfig::default()
    };
    GpuTimer::new(SimulatedQueries::with_latency(latency), config)
        .expect("valid test configuration")
}

/// Check two intervals for equality within float noise.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
