use thiserror::Error;

/// Top-level error type for the dayplan workspace.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for DayplanError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DayplanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid event: {0}")]
    Event(#[from] EventError),
}

/// Failures while building an [`Event`](crate::event::Event) from a
/// loosely-shaped record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Invalid timestamp in `{field}`: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid duration: {0} minutes")]
    InvalidDuration(String),

    #[error("Unknown event type: {0}")]
    UnknownKind(String),

    #[error("Event ends before it starts: {start} > {end}")]
    InvalidInterval { start: String, end: String },
}

impl From<toml::de::Error> for DayplanError {
    fn from(err: toml::de::Error) -> Self {
        DayplanError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DayplanError {
    fn from(err: toml::ser::Error) -> Self {
        DayplanError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DayplanError {
    fn from(err: serde_json::Error) -> Self {
        DayplanError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for dayplan operations.
pub type Result<T> = std::result::Result<T, DayplanError>;
