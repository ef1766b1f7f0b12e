//! Dayplan store crate - day-keyed event persistence.
//!
//! Defines the [`EventStore`] seam the scheduler reads conflicts through,
//! the shared day-bucket layout, and two adapters: an in-memory store and a
//! JSON file store.

pub mod buckets;
pub mod error;
pub mod json_file;
pub mod memory;

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use dayplan_core::Event;

pub use buckets::{DayBuckets, StoredRecord, UNDATED_BUCKET};
pub use error::StoreError;
pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

/// Read/write access to a day-keyed collection of serialized events.
pub trait EventStore: Send + Sync {
    /// Raw records whose day bucket falls within `days`, inclusive, ordered
    /// by bucket and then by stored position.
    fn read(&self, days: RangeInclusive<NaiveDate>) -> Result<Vec<StoredRecord>, StoreError>;

    /// Remove `to_remove` by key, then merge `to_add`, replacing entries that
    /// share a key.
    fn apply(&self, to_add: &[Event], to_remove: &[Event]) -> Result<(), StoreError>;
}
