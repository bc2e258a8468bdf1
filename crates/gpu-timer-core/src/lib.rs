//! Asynchronous GPU checkpoint timing.
//!
//! This crate provides:
//! - [`GpuTimer`], the checkpoint dispatcher that correlates named points in
//!   a GPU timeline and reports the intervals between them
//! - [`TimerQueryBackend`] for plugging in a graphics API's elapsed-time queries
//! - [`SimulatedQueries`], a deterministic backend for tests and demos
//!
//! # Example
//!
//! ```
//! use gpu_timer_core::{GpuTimer, SimulatedQueries};
//!
//! let mut timer = GpuTimer::with_defaults(SimulatedQueries::new());
//! timer
//!     .add_callback("shadows", "lighting", |from: &str, to: &str, secs: f64| {
//!         println!("{from} -> {to}: {:.3} ms", secs * 1e3);
//!     })
//!     .unwrap();
//!
//! for _ in 0..3 {
//!     timer.checkpoint("shadows").unwrap();
//!     // ... shadow pass ...
//!     timer.checkpoint("lighting").unwrap();
//!     // ... lighting pass ...
//! }
//! ```

pub mod backend;
pub mod engine;
pub mod ledger;
pub mod registry;
pub mod ring;
pub mod simulated;

pub use backend::TimerQueryBackend;
pub use engine::*;
pub use ledger::CheckpointLedger;
pub use registry::{CallbackRegistry, IntervalCallback, Registration};
pub use ring::{QueryRing, ReadyQuery, TimerSlot};
pub use simulated::{SimQuery, SimulatedQueries};
