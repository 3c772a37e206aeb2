//! Final split descriptors handed to the batch-execution framework.
//!
//! A split is immutable once planned: a set of key ranges per index plus the
//! hosts that serve them (used for locality hints when scheduling readers).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::range::{IndexRef, KeyRange};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSplit {
    /// Ranges to scan, per index. BTreeMap keeps serialization deterministic.
    pub ranges: BTreeMap<IndexRef, Vec<KeyRange>>,
    /// Distinct candidate serving locations, sorted.
    pub locations: Vec<String>,
}

impl InputSplit {
    pub fn new(ranges: BTreeMap<IndexRef, Vec<KeyRange>>, locations: Vec<String>) -> Self {
        Self { ranges, locations }
    }

    pub fn range_count(&self) -> usize {
        self.ranges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.range_count() == 0
    }

    /// Iterate `(index, range)` pairs in index order.
    pub fn iter_ranges(&self) -> impl Iterator<Item = (&IndexRef, &KeyRange)> {
        self.ranges
            .iter()
            .flat_map(|(index, ranges)| ranges.iter().map(move |r| (index, r)))
    }
}
