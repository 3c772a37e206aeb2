#![forbid(unsafe_code)]
//! keysplit-core: shared vocabulary for split planning.
//!
//! - `range`: byte-keyed ranges, index references, and storage extents.
//! - `split`: the immutable split descriptor handed to batch frameworks.
//! - `id`: per-plan sequence ids used as deterministic tie-breakers.
//! - `config`: planner configuration (serde + env overrides).
//! - `hash` / `manifest`: stable digests of a finished plan.
//!
//! No bigint math, locking, or network access lives here.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod prelude;
pub mod range;
pub mod split;

pub use error::{Error, Result};

/// Crate version stamped into plan manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
