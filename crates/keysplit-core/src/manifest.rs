//! Plan manifest: what was asked for, what came out, and a digest of it.
//!
//! Two plans over identical ranges, locations, and bounds hash identically,
//! which lets job submitters detect that a re-plan produced the same work.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanManifest {
    pub id: ManifestId,

    /// Stable hash of the emitted splits.
    pub plan_hash: Hash256,

    /// Planner version string for provenance.
    pub planner_version: String,

    /// Units built from resolved ranges, before growing/shrinking.
    pub initial_units: usize,

    /// Splits actually emitted.
    pub split_count: usize,

    pub min_splits: Option<usize>,
    pub max_splits: Option<usize>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl PlanManifest {
    pub fn new(
        min_splits: Option<usize>,
        max_splits: Option<usize>,
        initial_units: usize,
        started_ms: u64,
    ) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            plan_hash: Hash256([0u8; 32]),
            planner_version: crate::VERSION.to_string(),
            initial_units,
            split_count: 0,
            min_splits,
            max_splits,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, plan_hash: Hash256, split_count: usize) -> Self {
        self.finished_ms = finished_ms;
        self.plan_hash = plan_hash;
        self.split_count = split_count;
        self
    }

    /// True when the emitted count landed inside the requested bounds.
    pub fn within_bounds(&self) -> bool {
        let above_min = self.min_splits.map_or(true, |min| self.split_count >= min);
        let below_max = self
            .max_splits
            .filter(|max| *max > 0)
            .map_or(true, |max| self.split_count <= max);
        above_min && below_max
    }
}
