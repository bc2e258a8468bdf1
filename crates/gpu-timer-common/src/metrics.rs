//! Interval metrics for tracked checkpoint edges.
//!
//! Provides a ring buffer-based histogram of measured intervals so a
//! long-running frame loop keeps a bounded window of recent samples.

use std::time::Duration;

/// Interval statistics with a ring buffer for percentile queries.
#[derive(Debug)]
pub struct IntervalMetrics {
    /// Ring buffer of interval durations in nanoseconds.
    samples: Box<[u64]>,
    /// Current write position in the ring buffer.
    write_pos: usize,
    /// Number of samples held (saturates at buffer size).
    sample_count: usize,
    /// Total intervals recorded.
    count: u64,
    /// Minimum observed interval in nanoseconds.
    min_ns: u64,
    /// Maximum observed interval in nanoseconds.
    max_ns: u64,
    /// Sum of all intervals for mean calculation.
    sum_ns: u64,
    /// Number of intervals above the budget.
    over_budget_count: u64,
    /// Budget in nanoseconds.
    budget_ns: u64,
}

impl IntervalMetrics {
    /// Create a new collector.
    ///
    /// # Arguments
    ///
    /// * `histogram_size` - Number of samples to retain in the ring buffer.
    /// * `budget` - Intervals exceeding this are counted as over budget.
    #[must_use]
    pub fn new(histogram_size: usize, budget: Duration) -> Self {
        let size = histogram_size.max(1);
        Self {
            samples: vec![0u64; size].into_boxed_slice(),
            write_pos: 0,
            sample_count: 0,
            count: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            sum_ns: 0,
            over_budget_count: 0,
            budget_ns: u64::try_from(budget.as_nanos()).unwrap_or(u64::MAX),
        }
    }

    /// Record an interval given in seconds, as delivered to callbacks.
    ///
    /// Negative and NaN inputs are recorded as zero.
    pub fn record_secs(&mut self, seconds: f64) {
        let ns = (seconds.max(0.0) * 1e9).round() as u64;
        self.record_ns(ns);
    }

    /// Record an interval.
    pub fn record(&mut self, duration: Duration) {
        self.record_ns(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX));
    }

    /// Record an interval in nanoseconds directly.
    pub fn record_ns(&mut self, ns: u64) {
        self.samples[self.write_pos] = ns;
        self.write_pos = (self.write_pos + 1) % self.samples.len();
        self.sample_count = self.sample_count.saturating_add(1).min(self.samples.len());

        self.count += 1;
        self.min_ns = self.min_ns.min(ns);
        self.max_ns = self.max_ns.max(ns);
        self.sum_ns = self.sum_ns.wrapping_add(ns);

        if ns > self.budget_ns {
            self.over_budget_count += 1;
        }
    }

    /// Get total number of intervals recorded.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Get the most recent interval.
    #[must_use]
    pub fn last(&self) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }
        let idx = (self.write_pos + self.samples.len() - 1) % self.samples.len();
        Some(Duration::from_nanos(self.samples[idx]))
    }

    /// Get minimum observed interval.
    #[must_use]
    pub fn min(&self) -> Option<Duration> {
        (self.count > 0).then(|| Duration::from_nanos(self.min_ns))
    }

    /// Get maximum observed interval.
    #[must_use]
    pub fn max(&self) -> Option<Duration> {
        (self.count > 0).then(|| Duration::from_nanos(self.max_ns))
    }

    /// Get mean interval.
    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        (self.count > 0).then(|| Duration::from_nanos(self.sum_ns / self.count))
    }

    /// Get number of intervals that exceeded the budget.
    #[must_use]
    pub fn over_budget_count(&self) -> u64 {
        self.over_budget_count
    }

    /// Compute a percentile from the ring buffer.
    ///
    /// Returns `None` if no samples have been collected or if `percentile`
    /// is outside 0.0..=100.0.
    #[must_use]
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        self.percentiles(&[percentile]).first().map(|&(_, d)| d)
    }

    /// Compute multiple percentiles with a single sort.
    ///
    /// Invalid percentiles (< 0, > 100, or NaN) are skipped.
    #[must_use]
    pub fn percentiles(&self, percentiles: &[f64]) -> Vec<(f64, Duration)> {
        if self.sample_count == 0 {
            return vec![];
        }

        let mut sorted: Vec<u64> = self.samples[..self.sample_count].to_vec();
        sorted.sort_unstable();

        percentiles
            .iter()
            .filter(|&&p| (0.0..=100.0).contains(&p))
            .map(|&p| {
                let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
                let idx = idx.min(sorted.len() - 1);
                (p, Duration::from_nanos(sorted[idx]))
            })
            .collect()
    }

    /// Get a snapshot of current metrics.
    #[must_use]
    pub fn snapshot(&self) -> IntervalSnapshot {
        let seen = self.count > 0;
        IntervalSnapshot {
            count: self.count,
            min_ns: seen.then_some(self.min_ns),
            max_ns: seen.then_some(self.max_ns),
            mean_ns: seen.then(|| self.sum_ns / self.count),
            over_budget_count: self.over_budget_count,
            sample_count: self.sample_count,
        }
    }
}

/// Immutable snapshot of interval metrics for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct IntervalSnapshot {
    /// Total intervals recorded.
    pub count: u64,
    /// Minimum interval in nanoseconds.
    pub min_ns: Option<u64>,
    /// Maximum interval in nanoseconds.
    pub max_ns: Option<u64>,
    /// Mean interval in nanoseconds.
    pub mean_ns: Option<u64>,
    /// Number of intervals above the budget.
    pub over_budget_count: u64,
    /// Number of samples in the histogram.
    pub sample_count: usize,
}

impl IntervalSnapshot {
    /// Get jitter (max - min) in nanoseconds.
    #[must_use]
    pub fn jitter_ns(&self) -> Option<u64> {
        match (self.min_ns, self.max_ns) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        }
    }
}
