//! Convenient re-exports for downstream crates.

pub use crate::config::{Grouping, PlannerConfig, RetryConfig};
pub use crate::error::{Error, Result};
pub use crate::hash::{hash_serde, Hash256};
pub use crate::id::{EntryId, IdAllocator, UnitId};
pub use crate::manifest::{ManifestId, PlanManifest};
pub use crate::range::{Extent, IndexRef, KeyRange};
pub use crate::split::InputSplit;
