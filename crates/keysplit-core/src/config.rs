//! Planner configuration that downstream crates can serialize/deserialize.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How resolved ranges are bundled into the initial work units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// One unit per (location, index).
    #[default]
    Location,
    /// One unit per (location, extent, index): finer, one per tablet.
    Extent,
}

impl FromStr for Grouping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "location" => Ok(Grouping::Location),
            "extent" => Ok(Grouping::Extent),
            other => Err(Error::Config(format!(
                "unknown grouping '{other}' (expected 'location' or 'extent')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Grow the plan to at least this many splits (best effort).
    pub min_splits: Option<usize>,

    /// Shrink the plan to at most this many splits. `0` means unbounded.
    pub max_splits: Option<usize>,

    pub grouping: Grouping,

    /// Jitter window for location-resolution retries.
    pub retry_min_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,

    /// Ceiling on bind attempts per index. `None` retries until the table is
    /// reported gone/offline or the caller cancels.
    pub retry_max_attempts: Option<u32>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_splits: None,
            max_splits: None,
            grouping: Grouping::Location,
            retry_min_backoff_ms: 100,
            retry_max_backoff_ms: 200,
            retry_max_attempts: None,
        }
    }
}

/// Retry snapshot consumed by the location layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub min_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub max_attempts: Option<u32>,
}

impl PlannerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `KEYSPLIT_MIN_SPLITS`, `KEYSPLIT_MAX_SPLITS`: split-count bounds
    /// - `KEYSPLIT_GROUPING`: `location` or `extent`
    /// - `KEYSPLIT_RETRY_MIN_BACKOFF_MS`, `KEYSPLIT_RETRY_MAX_BACKOFF_MS`: jitter window
    /// - `KEYSPLIT_RETRY_MAX_ATTEMPTS`: bind attempt ceiling
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("KEYSPLIT_MIN_SPLITS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.min_splits = Some(v);
            }
        }

        if let Ok(s) = std::env::var("KEYSPLIT_MAX_SPLITS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_splits = Some(v);
            }
        }

        if let Ok(s) = std::env::var("KEYSPLIT_GROUPING") {
            if let Ok(v) = s.parse::<Grouping>() {
                cfg.grouping = v;
            }
        }

        if let Ok(s) = std::env::var("KEYSPLIT_RETRY_MIN_BACKOFF_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.retry_min_backoff_ms = v;
            }
        }

        if let Ok(s) = std::env::var("KEYSPLIT_RETRY_MAX_BACKOFF_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.retry_max_backoff_ms = v;
            }
        }

        if let Ok(s) = std::env::var("KEYSPLIT_RETRY_MAX_ATTEMPTS") {
            if let Ok(v) = s.parse::<u32>() {
                cfg.retry_max_attempts = Some(v);
            }
        }

        cfg
    }

    /// Reject settings the planner cannot honor.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.retry_min_backoff_ms > self.retry_max_backoff_ms {
            return Err(Error::Config(format!(
                "retry backoff window is inverted: min {}ms > max {}ms",
                self.retry_min_backoff_ms, self.retry_max_backoff_ms
            )));
        }
        if self.retry_max_attempts == Some(0) {
            return Err(Error::Config("retry_max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// Produce the retry snapshot used by the location layer.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            min_backoff_ms: self.retry_min_backoff_ms,
            max_backoff_ms: self.retry_max_backoff_ms,
            max_attempts: self.retry_max_attempts,
        }
    }
}
