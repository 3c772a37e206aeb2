//! End-to-end split planning against an in-memory tablet map

use keysplit_core::config::{Grouping, PlannerConfig};
use keysplit_core::id::IdAllocator;
use keysplit_core::range::{IndexRef, KeyRange};
use keysplit_planner::{balance, FixedRanges, IndexFilter, Query, SplitPlanner};
use keysplit_tests::{coverage, locator_with_tablets, probe_keys, ranges_of};
use num_bigint::BigInt;

fn idx() -> IndexRef {
    IndexRef::new("spatial")
}

fn ten_hosts() -> Vec<(Option<u8>, String)> {
    (0..10u8)
        .map(|i| {
            let end = if i == 9 { None } else { Some((i + 1) * 0x19) };
            (end, format!("h{i}:9997"))
        })
        .collect()
}

#[test]
fn test_min_splits_from_single_unit() {
    let locator = locator_with_tablets(&idx(), &[(None, "h1:9997")]);
    let planner = SplitPlanner::new(locator, FixedRanges::new());

    let splits = planner
        .plan(&[idx()], None, Some(5), None)
        .expect("planning succeeds");
    assert_eq!(splits.len(), 5);
    for split in &splits {
        assert!(!split.is_empty());
        assert_eq!(split.locations, vec!["h1".to_string()]);
    }

    let probes = probe_keys();
    let covered = coverage(&ranges_of(&splits, &idx()), &probes);
    assert!(covered.iter().all(|c| *c == 1), "every key lands in exactly one split");
}

#[test]
fn test_max_splits_from_ten_units() {
    let tablets = ten_hosts();
    let tablets: Vec<(Option<u8>, &str)> =
        tablets.iter().map(|(e, s)| (*e, s.as_str())).collect();
    let locator = locator_with_tablets(&idx(), &tablets);
    let planner = SplitPlanner::new(locator, FixedRanges::new());

    let (splits, manifest) = planner
        .plan_with_manifest(&[idx()], None, None, Some(2))
        .expect("planning succeeds");
    assert_eq!(manifest.initial_units, 10);
    assert_eq!(splits.len(), 2);

    let probes = probe_keys();
    let covered = coverage(&ranges_of(&splits, &idx()), &probes);
    assert!(covered.iter().all(|c| *c == 1));

    let hosts: usize = splits.iter().map(|s| s.locations.len()).sum();
    assert_eq!(hosts, 10);
}

#[test]
fn test_two_ranges_one_host_min_three() {
    let locator = locator_with_tablets(&idx(), &[(None, "h1:9997")]);
    let originals = vec![
        KeyRange::half_open(vec![0x00], vec![0x80]),
        KeyRange::closed(vec![0x80], vec![0xFF]),
    ];
    let translator = FixedRanges::new().with_ranges(idx(), originals.clone());
    let planner = SplitPlanner::new(locator, translator);
    let filter = IndexFilter::new();

    let splits = planner
        .plan(&[idx()], Some(&filter as &dyn Query), Some(3), None)
        .expect("planning succeeds");
    assert_eq!(splits.len(), 3);
    assert!(splits.iter().all(|s| s.locations == vec!["h1".to_string()]));

    let probes = probe_keys();
    assert_eq!(
        coverage(&ranges_of(&splits, &idx()), &probes),
        coverage(&originals, &probes)
    );

    let ids = IdAllocator::new();
    let mut set = planner
        .initial_units(&[idx()], Some(&filter as &dyn Query), None, &ids)
        .expect("units bind");
    balance(&mut set, Some(3), None);
    assert_eq!(set.len(), 3);
    let total: BigInt = set.iter().map(|unit| unit.total_magnitude_at(1)).sum();
    assert_eq!(total, BigInt::from(0x80 + 0x7F));
}

#[test]
fn test_min_splits_takes_priority_over_max() {
    let locator = locator_with_tablets(&idx(), &[(Some(0x80), "h1:9997"), (None, "h2:9997")]);
    let planner = SplitPlanner::new(locator, FixedRanges::new());
    let splits = planner.plan(&[idx()], None, Some(4), Some(1)).unwrap();
    assert_eq!(splits.len(), 4);
}

#[test]
fn test_zero_max_splits_is_unbounded() {
    let locator = locator_with_tablets(&idx(), &[(Some(0x80), "h1:9997"), (None, "h2:9997")]);
    let planner = SplitPlanner::new(locator, FixedRanges::new());
    let splits = planner.plan(&[idx()], None, None, Some(0)).unwrap();
    assert_eq!(splits.len(), 2);
}

#[test]
fn test_splits_emitted_in_ascending_magnitude() {
    let tablets = ten_hosts();
    let tablets: Vec<(Option<u8>, &str)> =
        tablets.iter().map(|(e, s)| (*e, s.as_str())).collect();
    let planner = SplitPlanner::new(locator_with_tablets(&idx(), &tablets), FixedRanges::new());
    let ids = keysplit_core::id::IdAllocator::new();
    let set = planner.initial_units(&[idx()], None, None, &ids).unwrap();
    let magnitudes: Vec<_> = set.magnitudes().map(|(m, _)| m.clone()).collect();
    let mut sorted = magnitudes.clone();
    sorted.sort();
    assert_eq!(magnitudes, sorted);
}

#[test]
fn test_multiple_indices_share_hosts_but_not_units() {
    let a = IndexRef::new("a");
    let b = IndexRef::new("b");
    let locator = locator_with_tablets(&a, &[(None, "h1:9997")]);
    keysplit_tests::add_tablets(&locator, &b, &[(None, "h1:9997")]);
    let planner = SplitPlanner::new(locator, FixedRanges::new());

    let splits = planner.plan(&[a.clone(), b.clone()], None, None, None).unwrap();
    assert_eq!(splits.len(), 2);
    assert!(splits.iter().all(|s| s.ranges.len() == 1));

    let merged = planner.plan(&[a, b], None, None, Some(1)).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].ranges.len(), 2);
}

#[test]
fn test_extent_grouping_from_config() {
    let tablets = [(Some(0x40), "h1:9997"), (Some(0x80), "h1:9997"), (None, "h1:9997")];
    let config = PlannerConfig {
        grouping: Grouping::Extent,
        ..PlannerConfig::default()
    };
    let locator = locator_with_tablets(&idx(), &tablets);
    let planner = SplitPlanner::new(locator, FixedRanges::new()).with_config(config);
    let splits = planner.plan(&[idx()], None, None, None).unwrap();
    assert_eq!(splits.len(), 3);
}

#[test]
fn test_identical_plans_hash_identically() {
    let build = || {
        let locator = locator_with_tablets(&idx(), &[(Some(0x80), "h1:9997"), (None, "h2:9997")]);
        SplitPlanner::new(locator, FixedRanges::new())
    };
    let (first, m1) = build().plan_with_manifest(&[idx()], None, Some(7), None).unwrap();
    let (second, m2) = build().plan_with_manifest(&[idx()], None, Some(7), None).unwrap();
    assert_eq!(first, second);
    assert_eq!(m1.plan_hash, m2.plan_hash);
    assert_ne!(m1.id, m2.id);
    assert_eq!(m1.split_count, 7);
}

#[test]
fn test_splits_serialize_to_json() {
    let locator = locator_with_tablets(&idx(), &[(None, "h1:9997")]);
    let planner = SplitPlanner::new(locator, FixedRanges::new());
    let splits = planner.plan(&[idx()], None, Some(2), None).unwrap();
    let json = serde_json::to_string(&splits).unwrap();
    let back: Vec<keysplit_core::split::InputSplit> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, splits);
}
