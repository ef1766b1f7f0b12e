//! In-memory event store.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use dayplan_core::Event;
use serde_json::Value;

use crate::buckets::{DayBuckets, StoredRecord};
use crate::error::StoreError;
use crate::EventStore;

/// Event store held entirely in memory.
///
/// Can be switched to "unavailable" to exercise the degraded read path.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    buckets: Mutex<DayBuckets>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `events`.
    pub fn with_events(events: &[Event]) -> Result<Self, StoreError> {
        let store = Self::new();
        store.apply(events, &[])?;
        Ok(store)
    }

    /// Append a raw record to `bucket` without any validation.
    pub fn insert_raw(&self, bucket: &str, value: Value) -> Result<(), StoreError> {
        self.lock()?.0.entry(bucket.to_string()).or_default().push(value);
        Ok(())
    }

    /// Make every subsequent read and write fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Result<DayBuckets, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, DayBuckets>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        self.buckets
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))
    }
}

impl EventStore for InMemoryStore {
    fn read(&self, days: RangeInclusive<NaiveDate>) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.lock()?.select(days))
    }

    fn apply(&self, to_add: &[Event], to_remove: &[Event]) -> Result<(), StoreError> {
        self.lock()?.merge(to_add, to_remove)?;
        Ok(())
    }
}
