#![forbid(unsafe_code)]
//! keysplit-planner: resolved key ranges → a bounded number of balanced,
//! location-aware splits.
//!
//! Design:
//! - `magnitude`: big-integer width of a key range at a chosen cardinality.
//! - `unit`: `SplitUnit`, a lockable bundle of (range, location) pairs per
//!   index that can merge with another unit or split off half of itself.
//! - `set`: `SplitSet`, units strictly ordered by magnitude then id.
//! - `planner`: translate → locate → group → grow/shrink → emit.
//! - `query`: the constraint-translation seam (the index strategy lives
//!   elsewhere) plus a fixed-range translator.
//! - `dsl`: YAML cluster layouts for offline planning and tests.

pub mod dsl;
pub mod error;
pub mod magnitude;
pub mod planner;
pub mod query;
pub mod set;
pub mod unit;

pub use dsl::yaml::{parse_yaml_layout, LayoutConfig, LayoutError, ParsedLayout};
pub use error::{PlanError, Result};
pub use planner::{balance, SplitPlanner};
pub use query::{FixedRanges, IndexFilter, NumericConstraints, NumericRange, Query, RangeTranslator};
pub use set::SplitSet;
pub use unit::{RangeLocationPair, SplitUnit};
