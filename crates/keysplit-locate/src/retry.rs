//! Stale-metadata retry loop around [`LocationResolver::bind`].
//!
//! Cached location metadata can be complete but out of date, so the cache is
//! dropped before the first attempt and again after every failed one. Between
//! attempts the table is checked: a deleted or offline table ends the loop
//! for good, anything else sleeps a jittered backoff and tries again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use keysplit_core::config::RetryConfig;
use keysplit_core::range::{IndexRef, KeyRange};
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{LocateError, Result};
use crate::resolver::{LocationResolver, ServerBins, TableState};

/// Backoff window and attempt ceiling for `bind_with_retry`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    /// `None` keeps retrying until the table is gone/offline or the caller
    /// cancels.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(200),
            max_attempts: None,
        }
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(cfg: RetryConfig) -> Self {
        Self {
            min_backoff: Duration::from_millis(cfg.min_backoff_ms),
            max_backoff: Duration::from_millis(cfg.max_backoff_ms),
            max_attempts: cfg.max_attempts,
        }
    }
}

impl RetryPolicy {
    /// Uniformly random delay inside `[min_backoff, max_backoff]`.
    pub fn next_backoff<G: Rng + ?Sized>(&self, rng: &mut G) -> Duration {
        let lo = self.min_backoff.as_millis() as u64;
        let hi = self.max_backoff.as_millis() as u64;
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Duration::from_millis(rng.gen_range(lo..=hi))
    }
}

/// Cooperative cancellation shared between a job submitter and the planner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Bind `ranges` until the resolver reports every one of them located.
///
/// Partial bins from a failed attempt are discarded, never merged with the
/// next attempt's.
pub fn bind_with_retry<R: LocationResolver + ?Sized>(
    resolver: &R,
    index: &IndexRef,
    ranges: &[KeyRange],
    policy: &RetryPolicy,
    cancel: &CancelToken,
) -> Result<ServerBins> {
    resolver.invalidate_cache(index);
    let mut rng = rand::thread_rng();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let binding = resolver.bind(index, ranges)?;
        if binding.is_complete() {
            debug!(index = %index, attempt, servers = binding.bins.len(), "ranges located");
            return Ok(binding.bins);
        }

        match resolver.table_state(index)? {
            TableState::Missing => {
                return Err(LocateError::TableDeleted {
                    index: index.clone(),
                })
            }
            TableState::Offline => {
                return Err(LocateError::TableOffline {
                    index: index.clone(),
                })
            }
            TableState::Online => {}
        }

        let unresolved = binding.unresolved.len();
        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            return Err(LocateError::RetriesExhausted {
                index: index.clone(),
                attempts: attempt,
                unresolved,
            });
        }
        if cancel.is_cancelled() {
            return Err(LocateError::Cancelled {
                index: index.clone(),
            });
        }

        let delay = policy.next_backoff(&mut rng);
        warn!(
            index = %index,
            attempt,
            unresolved,
            delay_ms = delay.as_millis() as u64,
            "unable to locate bins for ranges, retrying"
        );
        thread::sleep(delay);
        resolver.invalidate_cache(index);
    }
}
