//! In-memory location metadata for tests and offline planning.
//!
//! Holds a tablet map per index (extent → server) behind a mutex. Failure
//! modes of a real metadata service can be injected: a number of stale binds
//! that leave every range unresolved, a transport error, or a table state
//! other than online. Ranges of an offline or missing table never resolve.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use keysplit_core::range::{Extent, IndexRef, KeyRange};
use parking_lot::Mutex;

use crate::error::{LocateError, Result};
use crate::resolver::{Binding, LocationResolver, TableState};

#[derive(Debug, Clone)]
struct Tablet {
    extent: Extent,
    server: String,
}

#[derive(Debug, Default)]
struct LocatorState {
    tablets: HashMap<IndexRef, Vec<Tablet>>,
    states: HashMap<IndexRef, TableState>,
    stale_binds: HashMap<IndexRef, u32>,
    transport_failures: HashMap<IndexRef, String>,
    binds: u64,
    invalidations: u64,
}

/// Thread-safe in-memory tablet map.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocator {
    state: Arc<Mutex<LocatorState>>,
}

impl MemoryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the tablet `(prev_end_row, end_row]` of `index` on `server`.
    pub fn add_tablet(
        &self,
        index: IndexRef,
        prev_end_row: Option<Vec<u8>>,
        end_row: Option<Vec<u8>>,
        server: impl Into<String>,
    ) {
        let mut state = self.state.lock();
        let extent = Extent::new(index.clone(), prev_end_row, end_row);
        state.tablets.entry(index).or_default().push(Tablet {
            extent,
            server: server.into(),
        });
    }

    /// Override the reported state of the table backing `index`.
    pub fn set_table_state(&self, index: &IndexRef, table_state: TableState) {
        self.state.lock().states.insert(index.clone(), table_state);
    }

    /// Make the next `n` binds of `index` come back with nothing located.
    pub fn fail_next_binds(&self, index: &IndexRef, n: u32) {
        self.state.lock().stale_binds.insert(index.clone(), n);
    }

    /// Make every bind of `index` fail with a transport error.
    pub fn fail_transport(&self, index: &IndexRef, message: impl Into<String>) {
        self.state
            .lock()
            .transport_failures
            .insert(index.clone(), message.into());
    }

    pub fn bind_count(&self) -> u64 {
        self.state.lock().binds
    }

    pub fn invalidation_count(&self) -> u64 {
        self.state.lock().invalidations
    }

    pub fn tablet_count(&self, index: &IndexRef) -> usize {
        self.state.lock().tablets.get(index).map_or(0, Vec::len)
    }
}

impl LocationResolver for MemoryLocator {
    fn bind(&self, index: &IndexRef, ranges: &[KeyRange]) -> Result<Binding> {
        let mut state = self.state.lock();
        state.binds += 1;

        if let Some(message) = state.transport_failures.get(index) {
            return Err(LocateError::Transport {
                index: index.clone(),
                message: message.clone(),
            });
        }

        let unhosted = matches!(
            state.states.get(index),
            Some(TableState::Offline | TableState::Missing)
        );
        let stale = match state.stale_binds.get_mut(index) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        if unhosted || stale {
            return Ok(Binding {
                bins: BTreeMap::new(),
                unresolved: ranges.to_vec(),
            });
        }

        let mut binding = Binding::default();
        let tablets = state.tablets.get(index).map(Vec::as_slice).unwrap_or(&[]);
        for range in ranges {
            let mut located = false;
            for tablet in tablets {
                if range.clip(&tablet.extent.data_range()).is_some() {
                    binding
                        .bins
                        .entry(tablet.server.clone())
                        .or_default()
                        .entry(tablet.extent.clone())
                        .or_default()
                        .push(range.clone());
                    located = true;
                }
            }
            if !located {
                binding.unresolved.push(range.clone());
            }
        }
        Ok(binding)
    }

    fn invalidate_cache(&self, _index: &IndexRef) {
        self.state.lock().invalidations += 1;
    }

    fn table_state(&self, index: &IndexRef) -> Result<TableState> {
        let state = self.state.lock();
        if let Some(s) = state.states.get(index) {
            return Ok(*s);
        }
        Ok(if state.tablets.contains_key(index) {
            TableState::Online
        } else {
            TableState::Missing
        })
    }
}
