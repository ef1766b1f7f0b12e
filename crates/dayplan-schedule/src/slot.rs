//! First-fit slot placement inside a day's working window.

use chrono::{DateTime, FixedOffset};
use dayplan_core::Event;
use tracing::debug;

use crate::context::ScheduleContext;
use crate::error::{FailureReason, PlacementFailure};
use crate::schedule::Schedule;

/// Outcome of one placement attempt. The event is always handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Placed(Event),
    Unplaced(Event, PlacementFailure),
}

impl Placement {
    pub fn is_placed(&self) -> bool {
        matches!(self, Placement::Placed(_))
    }

    pub fn event(&self) -> &Event {
        match self {
            Placement::Placed(event) | Placement::Unplaced(event, _) => event,
        }
    }

    pub fn into_parts(self) -> (Event, Option<PlacementFailure>) {
        match self {
            Placement::Placed(event) => (event, None),
            Placement::Unplaced(event, failure) => (event, Some(failure)),
        }
    }
}

/// Places a dated event into the first free gap of its day.
#[derive(Debug, Clone, Copy)]
pub struct SlotAllocator {
    ctx: ScheduleContext,
}

impl SlotAllocator {
    pub fn new(ctx: ScheduleContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ScheduleContext {
        &self.ctx
    }

    /// Place `event` on its date, avoiding every placed event in `schedule`
    /// whose interval reaches into that date's window.
    ///
    /// Busy intervals are swept in chronological order and the event takes
    /// the first gap at least `duration` long. Gaps are measured against the
    /// window end as well, so a placed slot never leaves the window. Any
    /// slot the event already had is discarded first.
    pub fn place(&self, mut event: Event, schedule: &Schedule) -> Placement {
        event.start = None;
        event.end = None;

        let Some(date) = event.date else {
            let failure = PlacementFailure::new(&event, FailureReason::MissingDate);
            return Placement::Unplaced(event, failure);
        };
        let Some((window_start, window_end)) = self.ctx.window(date) else {
            let failure = PlacementFailure::new(&event, FailureReason::WindowUnresolvable { date });
            return Placement::Unplaced(event, failure);
        };

        let length = event.slot_length();
        if length <= chrono::Duration::zero() {
            let failure = PlacementFailure::new(&event, FailureReason::ZeroDuration);
            return Placement::Unplaced(event, failure);
        }

        // Selected by time, not by the stored date, which may be in another offset.
        let mut busy: Vec<(DateTime<FixedOffset>, DateTime<FixedOffset>)> = schedule
            .iter()
            .filter_map(Event::interval)
            .filter(|(start, end)| start < end && *start < window_end && *end > window_start)
            .collect();
        busy.sort();

        let mut cursor = window_start;
        for (busy_start, busy_end) in busy {
            if busy_start.min(window_end) - cursor >= length {
                return self.commit(event, cursor);
            }
            cursor = cursor.max(busy_end);
        }
        if window_end - cursor >= length {
            return self.commit(event, cursor);
        }

        debug!(summary = %event.summary, %date, duration = event.duration, "No free slot in window");
        let failure = PlacementFailure::new(
            &event,
            FailureReason::NoSlotInWindow {
                date,
                duration: event.duration,
            },
        );
        Placement::Unplaced(event, failure)
    }

    fn commit(&self, mut event: Event, start: DateTime<FixedOffset>) -> Placement {
        event.place_at(self.ctx.localize(start));
        debug!(
            summary = %event.summary,
            start = ?event.start,
            end = ?event.end,
            "Event placed"
        );
        Placement::Placed(event)
    }
}
