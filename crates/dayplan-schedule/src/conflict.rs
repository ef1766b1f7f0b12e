//! Overlap lookup against the persisted store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use dayplan_core::Event;
use dayplan_store::EventStore;
use tracing::{debug, warn};

use crate::context::ScheduleContext;

/// Finds stored events whose interval overlaps a candidate interval.
#[derive(Clone)]
pub struct ConflictFinder {
    store: Arc<dyn EventStore>,
    ctx: ScheduleContext,
}

impl ConflictFinder {
    pub fn new(store: Arc<dyn EventStore>, ctx: ScheduleContext) -> Self {
        Self { store, ctx }
    }

    /// Stored events overlapping `[start, end)`.
    ///
    /// Reads every day bucket from the local date of `start` to that of
    /// `end`, inclusive. Records that do not parse are skipped. An
    /// unreadable store yields no overlaps. Results keep store order and
    /// each keyed event appears once.
    pub fn find_overlaps(&self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Vec<Event> {
        let first = self.ctx.local_date(start);
        let last = self.ctx.local_date(end);

        let records = match self.store.read(first..=last) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    error = %e,
                    %first,
                    %last,
                    "Event store unavailable, assuming no prior events"
                );
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut overlaps = Vec::new();
        for record in records {
            let event = match Event::from_json(record.value, &self.ctx.tz) {
                Ok(event) => event,
                Err(e) => {
                    warn!(bucket = %record.bucket, error = %e, "Skipping malformed stored event");
                    continue;
                }
            };
            if !event.overlaps(&start, &end) {
                continue;
            }
            if let Some(key) = event.key() {
                if !seen.insert(key) {
                    continue;
                }
            }
            overlaps.push(event);
        }

        if overlaps.is_empty() {
            debug!(%start, %end, "Store read, no overlapping events");
        } else {
            debug!(%start, %end, count = overlaps.len(), "Overlapping stored events found");
        }
        overlaps
    }
}
