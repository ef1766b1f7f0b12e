//! Error types for event stores.

use dayplan_core::DayplanError;

/// Errors from reading or writing an event store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Store document is corrupt: {0}")]
    Corrupt(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for DayplanError {
    fn from(err: StoreError) -> Self {
        DayplanError::Store(err.to_string())
    }
}
