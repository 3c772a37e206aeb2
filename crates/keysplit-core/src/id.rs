//! Strongly-typed sequence identifiers used while planning.
//!
//! Ids are handed out by an [`IdAllocator`] owned by a single plan call, so two
//! identical plans assign identical ids. They are the secondary sort key that
//! keeps magnitude-ordered collections strictly ordered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

macro_rules! new_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

new_id!(UnitId);
new_id!(EntryId);

/// Monotonic id source shared by every unit created during one plan.
///
/// Cloning shares the counter. Ids start at 1 so that `0` can serve as a
/// lower sentinel in ordered range queries.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next_unit(&self) -> UnitId {
        UnitId::new(self.bump())
    }

    pub fn next_entry(&self) -> EntryId {
        EntryId::new(self.bump())
    }

    fn bump(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
