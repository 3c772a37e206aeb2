use keysplit_core::range::IndexRef;
use keysplit_locate::{LocateError, TableState};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Debug, Error)]
pub enum PlanError {
    /// Locating the index's ranges failed: a transport error, an exhausted
    /// retry ceiling, or cancellation.
    #[error("unable to plan splits for index '{index}': {source}")]
    SplitPlanningFailed {
        index: IndexRef,
        #[source]
        source: LocateError,
    },

    #[error("table backing index '{index}' is unavailable ({state})")]
    TableUnavailable { index: IndexRef, state: TableState },

    #[error(transparent)]
    Core(#[from] keysplit_core::error::Error),
}

impl PlanError {
    pub(crate) fn from_locate(index: &IndexRef, source: LocateError) -> Self {
        match source {
            LocateError::TableDeleted { .. } => PlanError::TableUnavailable {
                index: index.clone(),
                state: TableState::Missing,
            },
            LocateError::TableOffline { .. } => PlanError::TableUnavailable {
                index: index.clone(),
                state: TableState::Offline,
            },
            other => PlanError::SplitPlanningFailed {
                index: index.clone(),
                source: other,
            },
        }
    }
}
