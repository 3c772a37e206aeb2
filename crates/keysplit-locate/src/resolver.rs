//! The location-resolution boundary.
//!
//! A storage client implements [`LocationResolver`] on top of its own metadata
//! (tablet locator, region cache, ...). The planner only needs three things:
//! bin ranges by server and extent, drop cached metadata, and report whether
//! the backing table still exists and is online.

use std::collections::BTreeMap;
use std::fmt;

use keysplit_core::range::{Extent, IndexRef, KeyRange};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// server address → (extent → requested ranges overlapping that extent).
pub type ServerBins = BTreeMap<String, BTreeMap<Extent, Vec<KeyRange>>>;

/// Outcome of one `bind` attempt.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    pub bins: ServerBins,
    /// Ranges whose hosting server could not be determined (stale or
    /// incomplete metadata).
    pub unresolved: Vec<KeyRange>,
}

impl Binding {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableState {
    Online,
    Offline,
    Missing,
}

impl fmt::Display for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TableState::Online => "online",
            TableState::Offline => "offline",
            TableState::Missing => "missing",
        };
        f.write_str(s)
    }
}

pub trait LocationResolver: Send + Sync {
    /// Bin `ranges` of `index` by hosting server and extent.
    ///
    /// Must be idempotent: binding the same ranges twice against unchanged
    /// metadata yields the same bins.
    fn bind(&self, index: &IndexRef, ranges: &[KeyRange]) -> Result<Binding>;

    /// Drop any cached location metadata for `index`.
    fn invalidate_cache(&self, index: &IndexRef);

    /// Current state of the table backing `index`.
    fn table_state(&self, index: &IndexRef) -> Result<TableState>;
}

/// Host part of a `host:port` server address (`[v6]:port` also accepted).
pub fn host_of(server: &str) -> &str {
    if let Some(rest) = server.strip_prefix('[') {
        if let Some((host, _)) = rest.split_once(']') {
            return host;
        }
    }
    match server.split_once(':') {
        // A second colon means a bare IPv6 literal without a port.
        Some((host, port)) if !port.contains(':') => host,
        _ => server,
    }
}
