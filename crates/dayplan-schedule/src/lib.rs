//! Scheduling engine for dayplan.
//!
//! Places dated chores and undated todos into free slots of a day's working
//! window, and evicts previously placed chores that a newly added timed
//! event now collides with so they can be placed again.

pub mod conflict;
pub mod context;
pub mod error;
pub mod schedule;
pub mod scheduler;
pub mod slot;
pub mod todo;

pub use conflict::ConflictFinder;
pub use context::ScheduleContext;
pub use error::{FailureReason, PlacementFailure};
pub use schedule::Schedule;
pub use scheduler::{Reconciliation, Scheduler};
pub use slot::{Placement, SlotAllocator};
pub use todo::TodoPlacer;
