//! The query-to-ranges seam.
//!
//! The planner does not know how an index linearizes its dimensions. A
//! [`Query`] exposes per-index numeric constraints and a [`RangeTranslator`]
//! (normally backed by the index's space-filling-curve strategy) turns them
//! into sorted key ranges.

use std::collections::{BTreeMap, BTreeSet};

use keysplit_core::range::{IndexRef, KeyRange};
use serde::{Deserialize, Serialize};

/// Closed numeric interval along one index dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

/// Per-dimension constraints of a query against one index. Empty means
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericConstraints {
    pub dimensions: Vec<NumericRange>,
}

impl NumericConstraints {
    pub fn is_unconstrained(&self) -> bool {
        self.dimensions.is_empty()
    }
}

pub trait Query {
    fn is_supported(&self, index: &IndexRef) -> bool;
    fn index_constraints(&self, index: &IndexRef) -> NumericConstraints;
}

pub trait RangeTranslator: Send + Sync {
    /// Sorted key ranges covering `constraints` on `index`, at most
    /// `max_ranges` of them when a cap is given.
    fn translate(
        &self,
        index: &IndexRef,
        constraints: &NumericConstraints,
        max_ranges: Option<usize>,
    ) -> Vec<KeyRange>;
}

/// Unconstrained query over every index except the excluded ones.
#[derive(Debug, Clone, Default)]
pub struct IndexFilter {
    excluded: BTreeSet<IndexRef>,
}

impl IndexFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, index: IndexRef) -> Self {
        self.excluded.insert(index);
        self
    }
}

impl Query for IndexFilter {
    fn is_supported(&self, index: &IndexRef) -> bool {
        !self.excluded.contains(index)
    }

    fn index_constraints(&self, _index: &IndexRef) -> NumericConstraints {
        NumericConstraints::default()
    }
}

/// Translator with precomputed ranges per index; indices without an entry
/// cover the whole key space. Constraints are ignored.
#[derive(Debug, Clone, Default)]
pub struct FixedRanges {
    ranges: BTreeMap<IndexRef, Vec<KeyRange>>,
}

impl FixedRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ranges(mut self, index: IndexRef, ranges: Vec<KeyRange>) -> Self {
        self.ranges.insert(index, ranges);
        self
    }

    pub fn insert(&mut self, index: IndexRef, ranges: Vec<KeyRange>) {
        self.ranges.insert(index, ranges);
    }
}

impl RangeTranslator for FixedRanges {
    fn translate(
        &self,
        index: &IndexRef,
        _constraints: &NumericConstraints,
        max_ranges: Option<usize>,
    ) -> Vec<KeyRange> {
        let ranges = self
            .ranges
            .get(index)
            .cloned()
            .unwrap_or_else(|| vec![KeyRange::all()]);
        match max_ranges {
            Some(max) if max > 0 => coalesce(ranges, max),
            _ => ranges,
        }
    }
}

/// Reduce `ranges` to at most `max` covering ranges by joining neighbours.
pub fn coalesce(mut ranges: Vec<KeyRange>, max: usize) -> Vec<KeyRange> {
    ranges.sort_by(|a, b| a.start.cmp(&b.start));
    if max == 0 || ranges.len() <= max {
        return ranges;
    }
    let chunk = ranges.len().div_ceil(max);
    ranges
        .chunks(chunk)
        .map(|group| {
            let first = &group[0];
            let last = group
                .iter()
                .max_by(|a, b| match (&a.end, &b.end) {
                    (None, None) => std::cmp::Ordering::Equal,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (Some(x), Some(y)) => x.cmp(y).then(a.end_inclusive.cmp(&b.end_inclusive)),
                })
                .unwrap_or(first);
            KeyRange::new(
                first.start.clone(),
                first.start_inclusive,
                last.end.clone(),
                last.end_inclusive,
            )
        })
        .collect()
}
