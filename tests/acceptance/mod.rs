//! Acceptance scenarios for the GPU timer engine.
//!
//! Every scenario drives `GpuTimer` through its public API only, with
//! `SimulatedQueries` standing in for the GPU.

mod capacity_test;
mod common;
mod correlation_test;
mod lifecycle_test;
