//! Batch reconciliation of new events against the current schedule.
//!
//! Timed events go first: each one is checked against the persisted store
//! and any chore it now collides with is evicted and queued for placement
//! again. Chores and todos are then placed first-fit, in input order.

use std::collections::HashSet;
use std::sync::Arc;

use dayplan_core::{Clock, Event, EventKind, SystemClock};
use dayplan_store::EventStore;
use tracing::{debug, info, warn};

use crate::conflict::ConflictFinder;
use crate::context::ScheduleContext;
use crate::error::PlacementFailure;
use crate::schedule::Schedule;
use crate::slot::{Placement, SlotAllocator};
use crate::todo::TodoPlacer;

/// Result of one [`Scheduler::reconcile`] call.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// The schedule after the batch.
    pub schedule: Schedule,
    /// Events to create downstream, placed or not, in processing order.
    pub to_add: Vec<Event>,
    /// Previously stored chores that were evicted.
    pub to_remove: Vec<Event>,
    /// Why each unplaced event in `to_add` got no slot.
    pub unplaced: Vec<PlacementFailure>,
}

/// Orchestrates conflict detection and placement for one batch at a time.
///
/// `reconcile` is synchronous and takes the schedule by value, so a caller
/// cannot run two batches against the same schedule at once.
pub struct Scheduler {
    finder: ConflictFinder,
    allocator: SlotAllocator,
    todos: TodoPlacer,
}

impl Scheduler {
    /// Create a scheduler reading conflicts from `store`, using wall-clock
    /// time for todo placement.
    pub fn new(store: Arc<dyn EventStore>, ctx: ScheduleContext) -> Self {
        Self::with_clock(store, ctx, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn EventStore>, ctx: ScheduleContext, clock: Arc<dyn Clock>) -> Self {
        let allocator = SlotAllocator::new(ctx);
        Self {
            finder: ConflictFinder::new(store, ctx),
            allocator,
            todos: TodoPlacer::new(allocator, clock),
        }
    }

    /// Process `new_events` against `schedule`.
    ///
    /// Never fails: events that find no slot come back unplaced in
    /// `to_add`, with a matching entry in `unplaced`.
    pub fn reconcile(&self, new_events: Vec<Event>, mut schedule: Schedule) -> Reconciliation {
        let mut to_add = Vec::new();
        let mut to_remove = Vec::new();
        let mut unplaced = Vec::new();

        let mut timed = Vec::new();
        let mut chores = Vec::new();
        let mut todos = Vec::new();
        for event in new_events {
            match event.kind {
                EventKind::Timed => timed.push(event),
                EventKind::Chore => chores.push(event),
                EventKind::Todo => todos.push(event),
            }
        }

        let mut evicted_keys = HashSet::new();
        let mut requeued = Vec::new();
        for event in timed {
            match event.interval() {
                Some((start, end)) => {
                    for overlap in self.finder.find_overlaps(start, end) {
                        match overlap.kind {
                            EventKind::Chore => {
                                let Some(key) = overlap.key() else {
                                    continue;
                                };
                                if !evicted_keys.insert(key.clone()) {
                                    continue;
                                }
                                schedule.remove(&key);
                                info!(
                                    chore = %overlap.summary,
                                    %key,
                                    timed = %event.summary,
                                    "Evicting chore that collides with timed event"
                                );
                                requeued.push(fresh_chore(&overlap));
                                to_remove.push(overlap);
                            }
                            EventKind::Timed => warn!(
                                existing = %overlap.summary,
                                new = %event.summary,
                                "Timed events overlap, leaving both in place"
                            ),
                            EventKind::Todo => debug!(
                                todo = %overlap.summary,
                                timed = %event.summary,
                                "Placed todo overlaps timed event"
                            ),
                        }
                    }
                }
                None => warn!(summary = %event.summary, "Timed event without interval, skipping conflict check"),
            }
            schedule.push(event.clone());
            to_add.push(event);
        }

        // Evicted chores were committed before this batch, so they go first.
        requeued.extend(chores);
        for chore in requeued {
            let placement = self.allocator.place(chore, &schedule);
            commit(placement, &mut schedule, &mut to_add, &mut unplaced);
        }

        for todo in todos {
            let placement = self.todos.place(todo, &schedule);
            commit(placement, &mut schedule, &mut to_add, &mut unplaced);
        }

        info!(
            added = to_add.len(),
            removed = to_remove.len(),
            unplaced = unplaced.len(),
            scheduled = schedule.len(),
            "Batch reconciled"
        );

        Reconciliation {
            schedule,
            to_add,
            to_remove,
            unplaced,
        }
    }
}

/// A copy of an evicted chore that re-enters placement as a new chore.
fn fresh_chore(evicted: &Event) -> Event {
    let mut chore = evicted.clone();
    chore.id = None;
    chore.kind = EventKind::Chore;
    chore.clear_slot();
    chore
}

fn commit(
    placement: Placement,
    schedule: &mut Schedule,
    to_add: &mut Vec<Event>,
    unplaced: &mut Vec<PlacementFailure>,
) {
    let (event, failure) = placement.into_parts();
    if let Some(failure) = failure {
        warn!(%failure, "Event left unplaced");
        unplaced.push(failure);
    }
    schedule.push(event.clone());
    to_add.push(event);
}
