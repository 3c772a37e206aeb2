//! `SplitUnit`: a mergeable, splittable bundle of located key ranges.
//!
//! A unit maps each index to the (range, location) pairs it owns. Its size is
//! the sum of its ranges' magnitudes at a given cardinality; per-range and
//! per-unit magnitudes are memoized per cardinality and dropped whenever the
//! range set changes.
//!
//! Every mutation takes the unit's own lock. Operations that read two units
//! (`compare`, `merge`) never hold both locks at once.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::mem;

use keysplit_core::id::{EntryId, IdAllocator, UnitId};
use keysplit_core::range::{IndexRef, KeyRange};
use keysplit_core::split::InputSplit;
use num_bigint::BigInt;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::magnitude::{end_at, key_at, magnitude_at, required_cardinality, start_at};

/// Extra bytes a single range may be widened by when it is too narrow to
/// bisect at the unit's own cardinality.
const MAX_WIDENING: usize = 8;

/// One contiguous key range and the host that serves it.
#[derive(Debug, Clone)]
pub struct RangeLocationPair {
    id: EntryId,
    range: KeyRange,
    location: String,
    magnitudes: HashMap<usize, BigInt>,
}

impl RangeLocationPair {
    pub fn new(id: EntryId, range: KeyRange, location: impl Into<String>) -> Self {
        Self {
            id,
            range,
            location: location.into(),
            magnitudes: HashMap::new(),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn range(&self) -> &KeyRange {
        &self.range
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn magnitude_at(&mut self, cardinality: usize) -> BigInt {
        let range = &self.range;
        self.magnitudes
            .entry(cardinality)
            .or_insert_with(|| magnitude_at(range, cardinality))
            .clone()
    }
}

type Ranges = BTreeMap<IndexRef, Vec<RangeLocationPair>>;

#[derive(Debug, Default)]
struct UnitState {
    ranges: Ranges,
    totals: HashMap<usize, BigInt>,
}

impl UnitState {
    fn pairs(&self) -> impl Iterator<Item = &RangeLocationPair> {
        self.ranges.values().flatten()
    }

    fn range_count(&self) -> usize {
        self.ranges.values().map(Vec::len).sum()
    }

    fn max_cardinality(&self) -> usize {
        self.pairs()
            .map(|p| required_cardinality(&p.range))
            .fold(1, usize::max)
    }

    fn total_at(&mut self, cardinality: usize) -> BigInt {
        if let Some(total) = self.totals.get(&cardinality) {
            return total.clone();
        }
        let mut total = BigInt::from(0);
        for pair in self.ranges.values_mut().flatten() {
            total += pair.magnitude_at(cardinality);
        }
        self.totals.insert(cardinality, total.clone());
        total
    }

    fn push(&mut self, index: IndexRef, pair: RangeLocationPair) {
        self.ranges.entry(index).or_default().push(pair);
    }

    fn invalidate(&mut self) {
        self.totals.clear();
        self.ranges.retain(|_, pairs| !pairs.is_empty());
    }

    /// Move roughly half of this state's magnitude into a new range map.
    fn split_off(&mut self, ids: &IdAllocator) -> Ranges {
        match self.range_count() {
            0 => {
                error!("attempted to split a unit with no ranges");
                Ranges::new()
            }
            1 => self.bisect_single(ids),
            _ => self.carve_half(ids),
        }
    }

    fn carve_half(&mut self, ids: &IdAllocator) -> Ranges {
        let cardinality = self.max_cardinality();
        let total = self.total_at(cardinality);

        let mut ordered: BTreeMap<(BigInt, EntryId), (IndexRef, RangeLocationPair)> =
            BTreeMap::new();
        for (index, pairs) in mem::take(&mut self.ranges) {
            for mut pair in pairs {
                let magnitude = pair.magnitude_at(cardinality);
                ordered.insert((magnitude, pair.id), (index.clone(), pair));
            }
        }

        let mut target = total / 2u32;
        let mut moved = Ranges::new();
        loop {
            let ceiling = ordered
                .range((target.clone(), EntryId::new(0))..)
                .next()
                .map(|(key, _)| key.clone());

            let Some(key) = ceiling else {
                // Everything left is smaller than what is still owed: hand
                // over the largest piece whole and keep going.
                if ordered.len() <= 1 {
                    break;
                }
                if let Some(((magnitude, _), (index, pair))) = ordered.pop_last() {
                    moved.entry(index).or_default().push(pair);
                    target -= magnitude;
                }
                continue;
            };

            if key.0 > target {
                if let Some((index, pair)) = ordered.remove(&key) {
                    let excess = &key.0 - &target;
                    let (lower, mut upper) = carve(&pair, &excess, cardinality, ids);
                    moved.entry(index.clone()).or_default().push(lower);
                    let magnitude = upper.magnitude_at(cardinality);
                    ordered.insert((magnitude, upper.id), (index, upper));
                }
            } else if ordered.len() > 1 {
                if let Some((index, pair)) = ordered.remove(&key) {
                    moved.entry(index).or_default().push(pair);
                }
            }
            break;
        }

        for (_, (index, pair)) in ordered {
            self.push(index, pair);
        }
        self.invalidate();
        moved
    }

    /// Degenerate case: a single range is cut at its midpoint, widening the
    /// cardinality when it is too narrow to cut.
    fn bisect_single(&mut self, ids: &IdAllocator) -> Ranges {
        let base = self.max_cardinality();
        let Some((index, pair)) = self
            .ranges
            .iter()
            .find_map(|(index, pairs)| pairs.first().map(|p| (index.clone(), p.clone())))
        else {
            return Ranges::new();
        };

        for cardinality in base..=base + MAX_WIDENING {
            let magnitude = magnitude_at(&pair.range, cardinality);
            if magnitude < BigInt::from(2) {
                continue;
            }
            let midpoint = start_at(&pair.range, cardinality) + magnitude / 2u32;
            let split_key = key_at(&midpoint, cardinality);
            let (lower, upper) = split_range(&pair, split_key, ids);

            self.ranges.clear();
            self.push(index.clone(), lower);
            self.invalidate();

            let mut moved = Ranges::new();
            moved.insert(index, vec![upper]);
            return moved;
        }

        debug!(range = %pair.range, "range is too narrow to bisect");
        Ranges::new()
    }
}

/// Cut `pair` so that its upper part measures `excess`; returns `(lower, upper)`.
fn carve(
    pair: &RangeLocationPair,
    excess: &BigInt,
    cardinality: usize,
    ids: &IdAllocator,
) -> (RangeLocationPair, RangeLocationPair) {
    let split_value = end_at(&pair.range, cardinality) - excess;
    split_range(pair, key_at(&split_value, cardinality), ids)
}

/// `[start, key)` and `[key, end]`, preserving the outer bounds' inclusivity.
fn split_range(
    pair: &RangeLocationPair,
    key: Vec<u8>,
    ids: &IdAllocator,
) -> (RangeLocationPair, RangeLocationPair) {
    let range = &pair.range;
    let lower = KeyRange::new(
        range.start.clone(),
        range.start_inclusive,
        Some(key.clone()),
        false,
    );
    let upper = KeyRange::new(Some(key), true, range.end.clone(), range.end_inclusive);
    (
        RangeLocationPair::new(ids.next_entry(), lower, pair.location.clone()),
        RangeLocationPair::new(ids.next_entry(), upper, pair.location.clone()),
    )
}

/// A lockable group of located ranges, the unit of growth and shrinkage.
#[derive(Debug)]
pub struct SplitUnit {
    id: UnitId,
    ids: IdAllocator,
    state: Mutex<UnitState>,
}

impl SplitUnit {
    pub fn new(ids: &IdAllocator) -> Self {
        Self {
            id: ids.next_unit(),
            ids: ids.clone(),
            state: Mutex::new(UnitState::default()),
        }
    }

    /// A unit holding `ranges` of one index, all served from `location`.
    pub fn from_ranges(
        ids: &IdAllocator,
        index: IndexRef,
        location: &str,
        ranges: impl IntoIterator<Item = KeyRange>,
    ) -> Self {
        let unit = Self::new(ids);
        for range in ranges {
            unit.push(index.clone(), range, location);
        }
        unit
    }

    fn with_ranges(ids: &IdAllocator, ranges: Ranges) -> Self {
        let unit = Self::new(ids);
        unit.state.lock().ranges = ranges;
        unit
    }

    pub fn push(&self, index: IndexRef, range: KeyRange, location: &str) {
        let pair = RangeLocationPair::new(self.ids.next_entry(), range, location);
        let mut state = self.state.lock();
        state.push(index, pair);
        state.invalidate();
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().range_count() == 0
    }

    pub fn range_count(&self) -> usize {
        self.state.lock().range_count()
    }

    /// Longest key among this unit's range bounds, at least 1.
    pub fn max_cardinality(&self) -> usize {
        self.state.lock().max_cardinality()
    }

    pub fn total_magnitude_at(&self, cardinality: usize) -> BigInt {
        self.state.lock().total_at(cardinality)
    }

    pub fn total_magnitude(&self) -> BigInt {
        let mut state = self.state.lock();
        let cardinality = state.max_cardinality();
        state.total_at(cardinality)
    }

    pub fn locations(&self) -> BTreeSet<String> {
        self.state
            .lock()
            .pairs()
            .map(|p| p.location.clone())
            .collect()
    }

    /// Orders by total magnitude at the larger of the two units'
    /// cardinalities, then by id. `Equal` only for the same unit.
    pub fn compare(&self, other: &SplitUnit) -> Ordering {
        if self.id == other.id {
            return Ordering::Equal;
        }
        let cardinality = self.max_cardinality().max(other.max_cardinality());
        let mine = self.total_magnitude_at(cardinality);
        let theirs = other.total_magnitude_at(cardinality);
        mine.cmp(&theirs).then(self.id.cmp(&other.id))
    }

    /// Absorb every range of `other`.
    pub fn merge(&self, other: SplitUnit) {
        let absorbed = other.state.into_inner().ranges;
        let mut state = self.state.lock();
        for (index, pairs) in absorbed {
            state.ranges.entry(index).or_default().extend(pairs);
        }
        state.invalidate();
    }

    /// Move roughly half of this unit's magnitude into a new unit.
    ///
    /// Returns an empty unit, leaving `self` unchanged, when nothing can be
    /// moved.
    pub fn split(&self) -> SplitUnit {
        let moved = self.state.lock().split_off(&self.ids);
        SplitUnit::with_ranges(&self.ids, moved)
    }

    /// Snapshot as a final split; each index's ranges are sorted by start key.
    pub fn to_final_split(&self) -> InputSplit {
        let state = self.state.lock();
        let mut ranges: BTreeMap<IndexRef, Vec<KeyRange>> = BTreeMap::new();
        let mut locations = BTreeSet::new();
        for (index, pairs) in &state.ranges {
            let mut list: Vec<KeyRange> = pairs.iter().map(|p| p.range.clone()).collect();
            list.sort_by(|a, b| a.start.cmp(&b.start));
            locations.extend(pairs.iter().map(|p| p.location.clone()));
            ranges.insert(index.clone(), list);
        }
        InputSplit::new(ranges, locations.into_iter().collect())
    }
}
