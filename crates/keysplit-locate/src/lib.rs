#![forbid(unsafe_code)]
//! keysplit-locate: resolve key ranges to the servers hosting them.
//!
//! - `resolver`: the `LocationResolver` boundary implemented by storage clients.
//! - `retry`: the stale-metadata retry loop (`bind_with_retry`) with jittered
//!   backoff, an optional attempt ceiling, and cooperative cancellation.
//! - `memory_locator`: an in-memory tablet map used by tests and the CLI.
//!
//! Everything here is blocking; callers own any overall deadline.

pub mod error;
pub mod memory_locator;
pub mod resolver;
pub mod retry;

pub use error::{LocateError, Result};
pub use memory_locator::MemoryLocator;
pub use resolver::{host_of, Binding, LocationResolver, ServerBins, TableState};
pub use retry::{bind_with_retry, CancelToken, RetryPolicy};
