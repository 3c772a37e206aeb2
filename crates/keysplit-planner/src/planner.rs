//! Split planning: translate → locate → group → grow/shrink → emit.
//!
//! 1) each index's query constraints become sorted key ranges (or the whole
//!    index when there is no query),
//! 2) ranges are bound to servers and extents with retry,
//! 3) located ranges are clipped to their extent and grouped into one
//!    `SplitUnit` per (host, index), or per (host, extent, index),
//! 4) the largest unit is split until `min_splits` is reached, otherwise the
//!    two smallest are merged until at most `max_splits` remain,
//! 5) units are emitted in ascending magnitude order.

use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use keysplit_core::config::{Grouping, PlannerConfig};
use keysplit_core::hash::hash_serde;
use keysplit_core::id::IdAllocator;
use keysplit_core::manifest::PlanManifest;
use keysplit_core::range::{Extent, IndexRef, KeyRange};
use keysplit_core::split::InputSplit;
use keysplit_locate::{bind_with_retry, host_of, CancelToken, LocationResolver, RetryPolicy};
use tracing::{debug, info};

use crate::error::{PlanError, Result};
use crate::query::{Query, RangeTranslator};
use crate::set::SplitSet;
use crate::unit::SplitUnit;

type GroupKey = (String, Option<Extent>, IndexRef);

pub struct SplitPlanner<R, T> {
    resolver: R,
    translator: T,
    config: PlannerConfig,
    cancel: CancelToken,
}

impl<R: LocationResolver, T: RangeTranslator> SplitPlanner<R, T> {
    pub fn new(resolver: R, translator: T) -> Self {
        Self {
            resolver,
            translator,
            config: PlannerConfig::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a token that aborts location retries when cancelled.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Plan input splits for `indices`.
    ///
    /// `min_splits` takes priority over `max_splits`; a `max_splits` of zero
    /// means unbounded. Splits are returned in ascending magnitude order.
    pub fn plan(
        &self,
        indices: &[IndexRef],
        query: Option<&dyn Query>,
        min_splits: Option<usize>,
        max_splits: Option<usize>,
    ) -> Result<Vec<InputSplit>> {
        self.plan_with_manifest(indices, query, min_splits, max_splits)
            .map(|(splits, _)| splits)
    }

    /// Like [`plan`](Self::plan), also returning a manifest of the run.
    pub fn plan_with_manifest(
        &self,
        indices: &[IndexRef],
        query: Option<&dyn Query>,
        min_splits: Option<usize>,
        max_splits: Option<usize>,
    ) -> Result<(Vec<InputSplit>, PlanManifest)> {
        let started_ms = now_ms();
        let ids = IdAllocator::new();
        let mut set = self.initial_units(indices, query, max_splits, &ids)?;
        let initial_units = set.len();
        let manifest = PlanManifest::new(min_splits, max_splits, initial_units, started_ms);

        balance(&mut set, min_splits, max_splits);

        let splits: Vec<InputSplit> = set
            .into_units()
            .iter()
            .map(SplitUnit::to_final_split)
            .collect();
        let plan_hash = hash_serde(&splits)?;
        let manifest = manifest.finish(now_ms(), plan_hash, splits.len());

        info!(
            indices = indices.len(),
            initial_units,
            splits = splits.len(),
            plan_hash = %manifest.plan_hash,
            "split plan complete"
        );
        Ok((splits, manifest))
    }

    /// Steps 1–3: one unit per location group, before any balancing.
    pub fn initial_units(
        &self,
        indices: &[IndexRef],
        query: Option<&dyn Query>,
        max_splits: Option<usize>,
        ids: &IdAllocator,
    ) -> Result<SplitSet> {
        let policy = RetryPolicy::from(self.config.retry_config());
        let max_ranges = max_splits.filter(|max| *max > 0);
        let mut hosts: HashMap<String, String> = HashMap::new();
        let mut groups: BTreeMap<GroupKey, Vec<KeyRange>> = BTreeMap::new();

        for index in indices {
            let mut ranges = match query {
                Some(query) if !query.is_supported(index) => {
                    debug!(index = %index, "query not supported by index, skipping");
                    continue;
                }
                Some(query) => {
                    let constraints = query.index_constraints(index);
                    self.translator.translate(index, &constraints, max_ranges)
                }
                None => vec![KeyRange::all()],
            };
            // An empty range never binds, so it would be retried forever.
            ranges.retain(|range| !range.is_empty());
            if ranges.is_empty() {
                debug!(index = %index, "no ranges to locate");
                continue;
            }

            let bins = bind_with_retry(&self.resolver, index, &ranges, &policy, &self.cancel)
                .map_err(|source| PlanError::from_locate(index, source))?;

            for (server, extents) in bins {
                let location = hosts
                    .entry(server)
                    .or_insert_with_key(|server| host_of(server).to_string())
                    .clone();
                for (extent, covered) in extents {
                    let data = extent.data_range();
                    let clipped = covered.iter().filter_map(|r| r.clip(&data));
                    let extent_key = match self.config.grouping {
                        Grouping::Location => None,
                        Grouping::Extent => Some(extent),
                    };
                    groups
                        .entry((location.clone(), extent_key, index.clone()))
                        .or_default()
                        .extend(clipped);
                }
            }
        }

        let mut set = SplitSet::new();
        for ((location, _, index), ranges) in groups {
            if ranges.is_empty() {
                continue;
            }
            set.insert(SplitUnit::from_ranges(ids, index, &location, ranges));
        }
        debug!(units = set.len(), cardinality = set.cardinality(), "initial units");
        Ok(set)
    }
}

/// Grow toward `min_splits` by splitting the largest unit, or else shrink to
/// `max_splits` by merging the two smallest.
///
/// Growth is best effort: units that cannot be subdivided are set aside and
/// the loop stops once every remaining unit is indivisible.
pub fn balance(set: &mut SplitSet, min_splits: Option<usize>, max_splits: Option<usize>) {
    if let Some(min) = min_splits.filter(|min| set.len() < *min) {
        let mut indivisible = Vec::new();
        while set.len() + indivisible.len() < min {
            let Some(largest) = set.pop_largest() else {
                break;
            };
            let other = largest.split();
            if other.is_empty() {
                indivisible.push(largest);
                continue;
            }
            set.insert(largest);
            set.insert(other);
        }
        if set.len() + indivisible.len() < min {
            debug!(
                indivisible = indivisible.len(),
                "stopped growing: remaining units cannot be subdivided"
            );
        }
        for unit in indivisible {
            set.insert(unit);
        }
    } else if let Some(max) = max_splits.filter(|max| *max > 0 && set.len() > *max) {
        while set.len() > max {
            let Some(lowest) = set.pop_smallest() else {
                break;
            };
            let Some(next) = set.pop_smallest() else {
                set.insert(lowest);
                break;
            };
            lowest.merge(next);
            set.insert(lowest);
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
