use keysplit_core::range::IndexRef;
use thiserror::Error;

/// Result type local to keysplit-locate.
pub type Result<T> = std::result::Result<T, LocateError>;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("location lookup for index '{index}' failed: {message}")]
    Transport { index: IndexRef, message: String },

    #[error("table backing index '{index}' was deleted")]
    TableDeleted { index: IndexRef },

    #[error("table backing index '{index}' is offline")]
    TableOffline { index: IndexRef },

    #[error("gave up locating ranges for index '{index}' after {attempts} attempts ({unresolved} ranges unresolved)")]
    RetriesExhausted {
        index: IndexRef,
        attempts: u32,
        unresolved: usize,
    },

    #[error("location lookup for index '{index}' was cancelled")]
    Cancelled { index: IndexRef },
}

impl LocateError {
    /// Deleted/offline tables are definitive; nothing upstream should retry them.
    pub fn is_table_unavailable(&self) -> bool {
        matches!(
            self,
            LocateError::TableDeleted { .. } | LocateError::TableOffline { .. }
        )
    }
}
