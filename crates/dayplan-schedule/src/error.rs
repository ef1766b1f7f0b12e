//! Placement diagnostics.
//!
//! Nothing in the scheduling engine aborts a batch. An event that could not
//! be placed is returned unplaced and described by a [`PlacementFailure`].

use std::fmt;

use chrono::NaiveDate;
use dayplan_core::{Event, EventKind};
use serde::Serialize;

/// Why an event was left without a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("no free slot of {duration} minutes on {date}")]
    NoSlotInWindow { date: NaiveDate, duration: u32 },
    #[error("no free slot of {duration} minutes in the {days} days from {from}")]
    HorizonExhausted {
        from: NaiveDate,
        days: u32,
        duration: u32,
    },
    #[error("working window does not exist on {date}")]
    WindowUnresolvable { date: NaiveDate },
    #[error("event has no date to place it on")]
    MissingDate,
    #[error("event has no duration to place")]
    ZeroDuration,
}

/// A non-fatal placement failure for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementFailure {
    pub summary: String,
    pub kind: EventKind,
    #[serde(flatten)]
    pub reason: FailureReason,
}

impl PlacementFailure {
    pub fn new(event: &Event, reason: FailureReason) -> Self {
        Self {
            summary: event.summary.clone(),
            kind: event.kind,
            reason,
        }
    }
}

impl fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' unplaced: {}", self.kind, self.summary, self.reason)
    }
}
