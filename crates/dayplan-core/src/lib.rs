pub mod clock;
pub mod config;
pub mod error;
pub mod event;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::DayplanConfig;
pub use error::{DayplanError, EventError, Result};
pub use event::{Event, EventKey, EventKind, EventRecord, DEFAULT_CALENDAR, DEFAULT_DURATION_MINUTES};
