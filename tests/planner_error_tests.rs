//! Planner behaviour when location resolution fails

use keysplit_core::config::PlannerConfig;
use keysplit_core::range::{IndexRef, KeyRange};
use keysplit_locate::{CancelToken, LocateError, MemoryLocator, TableState};
use keysplit_planner::{FixedRanges, IndexFilter, PlanError, SplitPlanner};
use keysplit_tests::locator_with_tablets;

fn idx() -> IndexRef {
    IndexRef::new("spatial")
}

fn fast_config(max_attempts: Option<u32>) -> PlannerConfig {
    PlannerConfig {
        retry_min_backoff_ms: 0,
        retry_max_backoff_ms: 1,
        retry_max_attempts: max_attempts,
        ..PlannerConfig::default()
    }
}

fn planner(
    locator: MemoryLocator,
    max_attempts: Option<u32>,
) -> SplitPlanner<MemoryLocator, FixedRanges> {
    SplitPlanner::new(locator, FixedRanges::new()).with_config(fast_config(max_attempts))
}

#[test]
fn test_stale_metadata_is_retried_transparently() {
    let locator = locator_with_tablets(&idx(), &[(Some(0x80), "h1:9997"), (None, "h2:9997")]);
    locator.fail_next_binds(&idx(), 3);
    let planner = planner(locator, None);

    let splits = planner.plan(&[idx()], None, None, None).expect("recovers after retries");
    assert_eq!(splits.len(), 2);
    assert_eq!(planner.resolver().bind_count(), 4);
}

#[test]
fn test_offline_table_is_unavailable() {
    let locator = locator_with_tablets(&idx(), &[(None, "h1:9997")]);
    locator.set_table_state(&idx(), TableState::Offline);
    let planner = planner(locator, None);

    match planner.plan(&[idx()], None, Some(4), None) {
        Err(PlanError::TableUnavailable { index, state }) => {
            assert_eq!(index, idx());
            assert_eq!(state, TableState::Offline);
        }
        other => panic!("expected TableUnavailable, got {other:?}"),
    }
    assert_eq!(planner.resolver().bind_count(), 1);
}

#[test]
fn test_missing_table_is_unavailable() {
    let planner = planner(MemoryLocator::new(), None);
    let err = planner.plan(&[idx()], None, None, None).unwrap_err();
    assert!(matches!(
        err,
        PlanError::TableUnavailable {
            state: TableState::Missing,
            ..
        }
    ));
}

#[test]
fn test_exhausted_retries_fail_planning() {
    let locator = locator_with_tablets(&idx(), &[(None, "h1:9997")]);
    locator.fail_next_binds(&idx(), u32::MAX);
    let planner = planner(locator, Some(2));

    let err = planner.plan(&[idx()], None, None, None).unwrap_err();
    match err {
        PlanError::SplitPlanningFailed { index, source } => {
            assert_eq!(index, idx());
            assert!(matches!(source, LocateError::RetriesExhausted { attempts: 2, .. }));
        }
        other => panic!("expected SplitPlanningFailed, got {other:?}"),
    }
}

#[test]
fn test_transport_error_fails_planning() {
    let locator = locator_with_tablets(&idx(), &[(None, "h1:9997")]);
    locator.fail_transport(&idx(), "metadata service unreachable");
    let planner = planner(locator, None);

    let err = planner.plan(&[idx()], None, None, None).unwrap_err();
    assert!(matches!(
        err,
        PlanError::SplitPlanningFailed {
            source: LocateError::Transport { .. },
            ..
        }
    ));
    assert!(err.to_string().contains("spatial"));
}

#[test]
fn test_cancellation_fails_planning() {
    let locator = locator_with_tablets(&idx(), &[(None, "h1:9997")]);
    locator.fail_next_binds(&idx(), u32::MAX);
    let cancel = CancelToken::new();
    let planner = planner(locator, None).with_cancel_token(cancel.clone());
    cancel.cancel();

    let err = planner.plan(&[idx()], None, None, None).unwrap_err();
    assert!(matches!(
        err,
        PlanError::SplitPlanningFailed {
            source: LocateError::Cancelled { .. },
            ..
        }
    ));
}

#[test]
fn test_failure_on_second_index_aborts_whole_plan() {
    let good = IndexRef::new("good");
    let locator = locator_with_tablets(&good, &[(None, "h1:9997")]);
    let planner = planner(locator, None);
    let err = planner
        .plan(&[good, IndexRef::new("dropped")], None, None, None)
        .unwrap_err();
    assert!(matches!(err, PlanError::TableUnavailable { .. }));
}

#[test]
fn test_empty_query_range_is_not_retried() {
    let locator = locator_with_tablets(&idx(), &[(None, "h1:9997")]);
    let translator = FixedRanges::new().with_ranges(
        idx(),
        vec![
            KeyRange::half_open(vec![0x10], vec![0x10]),
            KeyRange::half_open(vec![0x20], vec![0x30]),
        ],
    );
    let planner = SplitPlanner::new(locator, translator).with_config(fast_config(None));

    let splits = planner
        .plan(&[idx()], Some(&IndexFilter::new()), None, None)
        .expect("empty range is dropped before binding");
    assert_eq!(planner.resolver().bind_count(), 1);
    let ranges: Vec<KeyRange> = splits
        .iter()
        .flat_map(|s| s.iter_ranges().map(|(_, r)| r.clone()))
        .collect();
    assert_eq!(ranges, vec![KeyRange::half_open(vec![0x20], vec![0x30])]);
}
