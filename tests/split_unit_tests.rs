//! SplitUnit / SplitSet behaviour across merge and split sequences

use std::cmp::Ordering;

use keysplit_core::id::IdAllocator;
use keysplit_core::range::{IndexRef, KeyRange};
use keysplit_planner::{SplitSet, SplitUnit};
use keysplit_tests::{coverage, probe_keys, ranges_of};
use num_bigint::BigInt;

fn idx() -> IndexRef {
    IndexRef::new("spatial")
}

fn r(a: u8, b: u8) -> KeyRange {
    KeyRange::half_open(vec![a], vec![b])
}

fn originals() -> Vec<KeyRange> {
    vec![
        r(0x00, 0x10),
        r(0x10, 0x38),
        r(0x40, 0x44),
        KeyRange::closed(vec![0x50], vec![0x90]),
        r(0xA0, 0xA1),
        KeyRange::new(Some(vec![0xC0]), false, None, true),
    ]
}

#[test]
fn test_distinct_units_never_compare_equal() {
    let ids = IdAllocator::new();
    let mut set = SplitSet::new();
    for start in [0x00u8, 0x20, 0x40, 0x60] {
        // identical magnitudes
        let range = r(start, start + 0x10);
        set.insert(SplitUnit::from_ranges(&ids, idx(), "h1", vec![range]));
    }
    let units = set.into_units();
    for (i, a) in units.iter().enumerate() {
        for (j, b) in units.iter().enumerate() {
            if i == j {
                assert_eq!(a.compare(b), Ordering::Equal);
            } else {
                assert_ne!(a.compare(b), Ordering::Equal);
                assert_eq!(a.compare(b), b.compare(a).reverse());
            }
        }
    }
}

#[test]
fn test_merge_then_split_conserves_magnitude_and_ranges() {
    let ids = IdAllocator::new();
    let all = originals();
    let (left, right) = all.split_at(3);
    let a = SplitUnit::from_ranges(&ids, idx(), "h1", left.to_vec());
    let b = SplitUnit::from_ranges(&ids, idx(), "h2", right.to_vec());
    let combined = a.total_magnitude_at(1) + b.total_magnitude_at(1);

    a.merge(b);
    let other = a.split();
    assert!(!a.is_empty());
    assert!(!other.is_empty());
    assert_eq!(a.total_magnitude_at(1) + other.total_magnitude_at(1), combined);

    let probes = probe_keys();
    let mut after = ranges_of(&[a.to_final_split()], &idx());
    let moved = ranges_of(&[other.to_final_split()], &idx());
    // disjoint halves
    let overlap = coverage(&after, &probes)
        .iter()
        .zip(coverage(&moved, &probes))
        .filter(|(x, y)| **x > 0 && *y > 0)
        .count();
    assert_eq!(overlap, 0);

    after.extend(moved);
    assert_eq!(coverage(&after, &probes), coverage(&originals(), &probes));
}

#[test]
fn test_final_split_reproduces_merged_ranges() {
    let ids = IdAllocator::new();
    let target = SplitUnit::new(&ids);
    for range in originals() {
        target.merge(SplitUnit::from_ranges(&ids, idx(), "h1", vec![range]));
    }
    let split = target.to_final_split();
    let mut expected = originals();
    expected.sort_by(|a, b| a.start.cmp(&b.start));
    assert_eq!(split.ranges[&idx()], expected);
    assert_eq!(split.locations, vec!["h1".to_string()]);
}

#[test]
fn test_split_merge_sequences_preserve_coverage() {
    let ids = IdAllocator::new();
    let probes = probe_keys();
    let expected = coverage(&originals(), &probes);

    let mut set = SplitSet::new();
    set.insert(SplitUnit::from_ranges(&ids, idx(), "h1", originals()));
    for round in 0..6 {
        for _ in 0..(round + 2) {
            let largest = set.pop_largest().expect("set is never empty");
            let other = largest.split();
            set.insert(largest);
            if !other.is_empty() {
                set.insert(other);
            }
        }
        while set.len() > 2 {
            let lowest = set.pop_smallest().expect("len > 2");
            let next = set.pop_smallest().expect("len > 1");
            lowest.merge(next);
            set.insert(lowest);
        }
        let splits: Vec<_> = set.iter().map(SplitUnit::to_final_split).collect();
        assert_eq!(coverage(&ranges_of(&splits, &idx()), &probes), expected);
    }
}

#[test]
fn test_cross_cardinality_comparison_uses_widest_key() {
    let ids = IdAllocator::new();
    // 1 at one byte, 0x0180_0000 at four bytes
    let wide = SplitUnit::from_ranges(
        &ids,
        IndexRef::new("wide"),
        "h1",
        vec![KeyRange::half_open(
            vec![0x30, 0x00, 0x00, 0x00],
            vec![0x31, 0x80, 0x00, 0x00],
        )],
    );
    // 1 at one byte, 0x0100_0000 at four bytes
    let narrow =
        SplitUnit::from_ranges(&ids, IndexRef::new("narrow"), "h1", vec![r(0x10, 0x11)]);

    assert_eq!(wide.max_cardinality(), 4);
    assert_eq!(narrow.max_cardinality(), 1);
    assert_eq!(wide.total_magnitude_at(1), narrow.total_magnitude_at(1));
    // at one byte this is a tie broken by id in favour of `narrow`
    assert_eq!(wide.compare(&narrow), Ordering::Greater);
    assert_eq!(narrow.compare(&wide), Ordering::Less);

    let wide_id = wide.id();
    let mut set = SplitSet::new();
    set.insert(narrow);
    set.insert(wide);
    assert_eq!(set.cardinality(), 4);
    assert_eq!(set.pop_largest().map(|u| u.id()), Some(wide_id));
}

#[test]
fn test_open_ended_unit_measures_to_ff() {
    let ids = IdAllocator::new();
    let unit = SplitUnit::from_ranges(
        &ids,
        idx(),
        "h1",
        vec![KeyRange::new(Some(vec![0xF0]), true, None, true)],
    );
    assert_eq!(unit.total_magnitude(), BigInt::from(0x0F));
}
