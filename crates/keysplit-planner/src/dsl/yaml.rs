//! YAML cluster layouts → resolver + translator for offline planning.
//!
//! Example:
//! ```yaml
//! config: { min_splits: 4, grouping: location }
//! indices:
//!   - name: spatial
//!     tablets:
//!       - { end: "40", server: "ts1:9997" }
//!       - { end: "c0", server: "ts2:9997" }
//!       - { server: "ts3:9997" }          # last tablet is open-ended
//!     ranges:
//!       - { start: "00", end: "80" }      # half-open unless stated
//!       - { start: "80", end: "ff", end_inclusive: true }
//!   - name: attributes
//!     state: offline
//!     tablets:
//!       - { server: "ts1:9997" }
//! plan: [spatial]
//! ```
//!
//! Keys are hex. Tablets must be listed in ascending end-row order.

use keysplit_core::config::{Grouping, PlannerConfig};
use keysplit_core::range::{from_hex, IndexRef, KeyRange};
use keysplit_locate::{MemoryLocator, TableState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::{FixedRanges, IndexFilter};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("index '{index}': {message}")]
    Index { index: String, message: String },

    #[error("plan names unknown index '{0}'")]
    UnknownIndex(String),

    #[error(transparent)]
    Core(#[from] keysplit_core::error::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub config: Option<LayoutConfig>,
    pub indices: Vec<IndexDef>,
    /// Indices to plan; all declared indices when absent.
    #[serde(default)]
    pub plan: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    #[serde(default)]
    pub state: Option<TableState>,
    #[serde(default)]
    pub tablets: Vec<TabletDef>,
    #[serde(default)]
    pub ranges: Option<Vec<RangeDef>>,
    /// Whether the query applies to this index.
    #[serde(default = "default_true")]
    pub supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabletDef {
    #[serde(default)]
    pub end: Option<String>,
    pub server: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeDef {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default = "default_true")]
    pub start_inclusive: bool,
    #[serde(default)]
    pub end_inclusive: bool,
}

fn default_true() -> bool {
    true
}

/// Planner settings a layout may carry; unset fields leave the base config alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub min_splits: Option<usize>,
    pub max_splits: Option<usize>,
    pub grouping: Option<Grouping>,
    pub retry_min_backoff_ms: Option<u64>,
    pub retry_max_backoff_ms: Option<u64>,
    pub retry_max_attempts: Option<u32>,
}

impl LayoutConfig {
    pub fn apply_to(&self, cfg: &mut PlannerConfig) {
        if let Some(v) = self.min_splits {
            cfg.min_splits = Some(v);
        }
        if let Some(v) = self.max_splits {
            cfg.max_splits = Some(v);
        }
        if let Some(v) = self.grouping {
            cfg.grouping = v;
        }
        if let Some(v) = self.retry_min_backoff_ms {
            cfg.retry_min_backoff_ms = v;
        }
        if let Some(v) = self.retry_max_backoff_ms {
            cfg.retry_max_backoff_ms = v;
        }
        if let Some(v) = self.retry_max_attempts {
            cfg.retry_max_attempts = Some(v);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedLayout {
    /// Indices to plan, in declaration (or `plan:`) order.
    pub indices: Vec<IndexRef>,
    pub locator: MemoryLocator,
    pub translator: FixedRanges,
    pub query: IndexFilter,
    pub config: LayoutConfig,
}

pub fn parse_yaml_layout(yaml_src: &str) -> Result<ParsedLayout, LayoutError> {
    let doc: Layout = serde_yaml::from_str(yaml_src)?;
    let locator = MemoryLocator::new();
    let mut translator = FixedRanges::new();
    let mut query = IndexFilter::new();
    let mut declared = Vec::with_capacity(doc.indices.len());

    for def in &doc.indices {
        let index = IndexRef::new(def.name.clone());
        if declared.contains(&index) {
            return Err(invalid(def, "declared more than once"));
        }
        add_tablets(&locator, &index, def)?;
        if let Some(state) = def.state {
            locator.set_table_state(&index, state);
        }
        if let Some(ranges) = &def.ranges {
            let ranges = ranges
                .iter()
                .map(|range| to_key_range(def, range))
                .collect::<Result<Vec<_>, _>>()?;
            translator.insert(index.clone(), ranges);
        }
        if !def.supported {
            query = query.exclude(index.clone());
        }
        declared.push(index);
    }

    let indices = match doc.plan {
        None => declared,
        Some(names) => names
            .into_iter()
            .map(|name| {
                let index = IndexRef::new(name.clone());
                if declared.contains(&index) {
                    Ok(index)
                } else {
                    Err(LayoutError::UnknownIndex(name))
                }
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(ParsedLayout {
        indices,
        locator,
        translator,
        query,
        config: doc.config.unwrap_or_default(),
    })
}

fn invalid(def: &IndexDef, message: impl Into<String>) -> LayoutError {
    LayoutError::Index {
        index: def.name.clone(),
        message: message.into(),
    }
}

fn add_tablets(
    locator: &MemoryLocator,
    index: &IndexRef,
    def: &IndexDef,
) -> Result<(), LayoutError> {
    let last = def.tablets.len().saturating_sub(1);
    let mut prev_end: Option<Vec<u8>> = None;
    for (i, tablet) in def.tablets.iter().enumerate() {
        let end = match (&tablet.end, i == last) {
            (None, true) => None,
            (None, false) => return Err(invalid(def, "only the last tablet may be open-ended")),
            (Some(_), true) => return Err(invalid(def, "the last tablet must be open-ended")),
            (Some(hex), false) => Some(from_hex(hex)?),
        };
        if let (Some(prev), Some(cur)) = (&prev_end, &end) {
            if cur <= prev {
                return Err(invalid(def, "tablet end rows must be strictly ascending"));
            }
        }
        locator.add_tablet(
            index.clone(),
            prev_end.clone(),
            end.clone(),
            tablet.server.clone(),
        );
        prev_end = end;
    }
    Ok(())
}

fn to_key_range(index: &IndexDef, def: &RangeDef) -> Result<KeyRange, LayoutError> {
    let start = def.start.as_deref().map(from_hex).transpose()?;
    let end = def.end.as_deref().map(from_hex).transpose()?;
    let range = KeyRange::new(start, def.start_inclusive, end, def.end_inclusive);
    if range.is_empty() {
        return Err(invalid(index, format!("range {range} is empty")));
    }
    Ok(range)
}
