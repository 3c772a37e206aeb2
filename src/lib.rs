#![forbid(unsafe_code)]
//! keysplit: magnitude-balanced, location-aware input split planning over
//! sorted key-value tables.
//!
//! This facade re-exports the workspace crates:
//! - `keysplit-core`: key ranges, extents, split descriptors, config, manifests
//! - `keysplit-locate`: range → server binding with staleness retry
//! - `keysplit-planner`: split units, the split set, and the planner itself

pub use keysplit_core::prelude::*;
pub use keysplit_locate::{
    bind_with_retry, host_of, CancelToken, LocateError, LocationResolver, MemoryLocator,
    RetryPolicy, TableState,
};
pub use keysplit_planner::{
    balance, parse_yaml_layout, FixedRanges, IndexFilter, LayoutError, NumericConstraints,
    ParsedLayout, PlanError, Query, RangeTranslator, SplitPlanner, SplitSet, SplitUnit,
};
