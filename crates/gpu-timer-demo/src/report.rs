//! Interval report for the demo run.
//!
//! Collects the engine snapshot and every tracked edge's statistics into a
//! serializable report, printed either as text or as JSON.

use gpu_timer_common::metrics::{IntervalMetrics, IntervalSnapshot};
use gpu_timer_core::{CheckpointLedger, TimerSnapshot};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

/// One requested percentile of a tracked edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileEntry {
    /// Requested percentile (0-100).
    pub percentile: f64,
    /// Interval at that percentile in nanoseconds.
    pub interval_ns: u64,
}

/// Statistics for a single tracked `from -> to` edge.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeReport {
    /// Checkpoint the interval starts at.
    pub from: String,
    /// Checkpoint the interval ends at.
    pub to: String,
    /// Aggregate statistics.
    pub stats: IntervalSnapshot,
    /// Requested percentiles over the retained window.
    pub percentiles: Vec<PercentileEntry>,
}

impl EdgeReport {
    /// Summarize `metrics` for the edge `from -> to`.
    #[must_use]
    pub fn from_metrics(from: &str, to: &str, metrics: &IntervalMetrics, percentiles: &[f64]) -> Self {
        Self {
            from: from.to_owned(),
            to: to.to_owned(),
            stats: metrics.snapshot(),
            percentiles: metrics
                .percentiles(percentiles)
                .into_iter()
                .map(|(percentile, d)| PercentileEntry {
                    percentile,
                    interval_ns: u64::try_from(d.as_nanos()).unwrap_or(u64::MAX),
                })
                .collect(),
        }
    }
}

/// Last time a checkpoint was reached on the accumulated GPU clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointTime {
    /// Checkpoint name.
    pub name: String,
    /// Accumulated GPU time in seconds.
    pub last_time_s: f64,
}

/// Ledger entries sorted by name.
#[must_use]
pub fn checkpoint_times(ledger: &CheckpointLedger) -> Vec<CheckpointTime> {
    let mut times: Vec<CheckpointTime> = ledger
        .iter()
        .map(|(name, last_time_s)| CheckpointTime {
            name: name.to_owned(),
            last_time_s,
        })
        .collect();
    times.sort_by(|a, b| a.name.cmp(&b.name));
    times
}

/// Full demo report.
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    /// Frames driven through the engine.
    pub frames: u64,
    /// Engine counters at the end of the run.
    pub timer: TimerSnapshot,
    /// Per-edge statistics in registration order.
    pub edges: Vec<EdgeReport>,
    /// Last time of every checkpoint reached.
    pub checkpoints: Vec<CheckpointTime>,
}

fn fmt_ns(ns: Option<u64>) -> String {
    ns.map_or_else(
        || "-".to_owned(),
        |ns| humantime::format_duration(Duration::from_nanos(ns)).to_string(),
    )
}

/// Render the report as human-readable text.
#[must_use]
pub fn format_text(report: &DemoReport) -> String {
    let timer = &report.timer;
    let mut output = String::new();

    let _ = writeln!(
        output,
        "GPU timer: {} frames, {} checkpoints, {:.3}s GPU time, state {}",
        report.frames, timer.checkpoints, timer.total_time_s, timer.state
    );
    let _ = writeln!(
        output,
        "Query ring: capacity {}, pending {}, drained {}, dropped {}",
        timer.capacity, timer.pending, timer.drained_queries, timer.dropped_queries
    );

    for edge in &report.edges {
        let _ = write!(
            output,
            "  {:>8} -> {:<8} n={:<6} mean={:<12} max={:<12}",
            edge.from,
            edge.to,
            edge.stats.count,
            fmt_ns(edge.stats.mean_ns),
            fmt_ns(edge.stats.max_ns),
        );
        for entry in &edge.percentiles {
            let _ = write!(
                output,
                " p{}={:<12}",
                entry.percentile,
                fmt_ns(Some(entry.interval_ns))
            );
        }
        let _ = writeln!(output, " over_budget={}", edge.stats.over_budget_count);
    }

    for checkpoint in &report.checkpoints {
        let _ = writeln!(
            output,
            "  {:>8} last reached at {:.6}s",
            checkpoint.name, checkpoint.last_time_s
        );
    }

    output
}
