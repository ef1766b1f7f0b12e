//! Placement of undated todos over a rolling horizon.

use std::sync::Arc;

use dayplan_core::{Clock, Event};
use tracing::{debug, warn};

use crate::error::{FailureReason, PlacementFailure};
use crate::schedule::Schedule;
use crate::slot::{Placement, SlotAllocator};

/// Tries each day of the horizon in turn, starting today.
#[derive(Clone)]
pub struct TodoPlacer {
    allocator: SlotAllocator,
    clock: Arc<dyn Clock>,
}

impl TodoPlacer {
    pub fn new(allocator: SlotAllocator, clock: Arc<dyn Clock>) -> Self {
        Self { allocator, clock }
    }

    /// Place `event` on the first day of the horizon with a free slot.
    ///
    /// When every day is full the todo comes back undated and unplaced.
    pub fn place(&self, mut event: Event, schedule: &Schedule) -> Placement {
        let ctx = self.allocator.context();
        let today = self.clock.today(&ctx.tz);

        for offset in 0..u64::from(ctx.horizon_days) {
            let Some(candidate) = today.checked_add_days(chrono::Days::new(offset)) else {
                break;
            };
            event.date = Some(candidate);
            match self.allocator.place(event, schedule) {
                Placement::Placed(placed) => {
                    debug!(summary = %placed.summary, date = %candidate, "Todo placed");
                    return Placement::Placed(placed);
                }
                Placement::Unplaced(unplaced, _) => event = unplaced,
            }
        }

        event.start = None;
        event.end = None;
        event.date = None;
        warn!(
            summary = %event.summary,
            days = ctx.horizon_days,
            from = %today,
            "No free slot for todo within horizon"
        );
        let failure = PlacementFailure::new(
            &event,
            FailureReason::HorizonExhausted {
                from: today,
                days: ctx.horizon_days,
                duration: event.duration,
            },
        );
        Placement::Unplaced(event, failure)
    }
}
