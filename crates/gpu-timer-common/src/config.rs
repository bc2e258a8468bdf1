//! Configuration structures for the timer engine.
//!
//! Supports TOML deserialization with defaults matching a typical
//! frame loop: eight in-flight queries and a 60 Hz frame budget.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Default number of timer queries in the ring.
pub const DEFAULT_QUERY_SLOTS: usize = 8;

/// Default ceiling for ring growth.
pub const DEFAULT_MAX_QUERY_SLOTS: usize = 64;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Initial number of query slots in the ring.
    pub query_slots: usize,

    /// What to do when every slot is still awaiting its result.
    pub overrun: OverrunPolicy,

    /// Upper bound on ring capacity under [`OverrunPolicy::Grow`].
    pub max_query_slots: usize,

    /// Interval metrics configuration.
    pub metrics: MetricsConfig,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            query_slots: DEFAULT_QUERY_SLOTS,
            overrun: OverrunPolicy::default(),
            max_query_slots: DEFAULT_MAX_QUERY_SLOTS,
            metrics: MetricsConfig::default(),
        }
    }
}

/// Policy for handling a ring overrun.
///
/// An overrun happens when a checkpoint needs a fresh slot but every slot
/// holds a query whose result has not been drained yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverrunPolicy {
    /// Allocate more queries, up to `max_query_slots`; fault beyond that.
    #[default]
    Grow,
    /// Reject the checkpoint and enter the faulted state.
    Fault,
    /// Discard the oldest pending result and reuse its slot.
    Overwrite,
}

/// Interval metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Number of samples retained per tracked edge.
    pub histogram_size: usize,

    /// Percentiles to report (e.g., [50, 90, 99]).
    pub percentiles: Vec<f64>,

    /// Intervals longer than this count as over budget.
    #[serde(with = "humantime_serde")]
    pub budget: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            histogram_size: 1024,
            percentiles: vec![50.0, 90.0, 99.0],
            budget: Duration::from_millis(16),
        }
    }
}

impl TimerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        debug!(?path, "Reading timer config");
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_slots == 0 {
            return Err(ConfigError::Invalid("query_slots must be at least 1".into()));
        }
        if self.max_query_slots < self.query_slots {
            return Err(ConfigError::Invalid(format!(
                "max_query_slots ({}) is below query_slots ({})",
                self.max_query_slots, self.query_slots
            )));
        }
        if self.metrics.histogram_size == 0 {
            return Err(ConfigError::Invalid(
                "metrics.histogram_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
