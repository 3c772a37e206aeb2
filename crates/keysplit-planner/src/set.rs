//! Strictly ordered collection of split units.
//!
//! Units are keyed by `(total magnitude, id)` at the set's cardinality, which
//! is the widest key length of any unit ever inserted. Comparing every unit at
//! one shared cardinality keeps the order total; when a wider unit arrives all
//! keys are recomputed.

use std::collections::BTreeMap;
use std::mem;

use keysplit_core::id::UnitId;
use num_bigint::BigInt;

use crate::unit::SplitUnit;

#[derive(Debug)]
pub struct SplitSet {
    cardinality: usize,
    units: BTreeMap<(BigInt, UnitId), SplitUnit>,
}

impl Default for SplitSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitSet {
    pub fn new() -> Self {
        Self {
            cardinality: 1,
            units: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn insert(&mut self, unit: SplitUnit) {
        let needed = unit.max_cardinality();
        if needed > self.cardinality {
            self.cardinality = needed;
            self.rekey();
        }
        let key = (unit.total_magnitude_at(self.cardinality), unit.id());
        self.units.insert(key, unit);
    }

    fn rekey(&mut self) {
        for (_, unit) in mem::take(&mut self.units) {
            let key = (unit.total_magnitude_at(self.cardinality), unit.id());
            self.units.insert(key, unit);
        }
    }

    pub fn pop_largest(&mut self) -> Option<SplitUnit> {
        self.units.pop_last().map(|(_, unit)| unit)
    }

    pub fn pop_smallest(&mut self) -> Option<SplitUnit> {
        self.units.pop_first().map(|(_, unit)| unit)
    }

    /// Units in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &SplitUnit> {
        self.units.values()
    }

    /// Magnitude of each unit at the set's cardinality, ascending.
    pub fn magnitudes(&self) -> impl Iterator<Item = (&BigInt, &SplitUnit)> {
        self.units.iter().map(|((magnitude, _), unit)| (magnitude, unit))
    }

    pub fn into_units(self) -> Vec<SplitUnit> {
        self.units.into_values().collect()
    }
}
