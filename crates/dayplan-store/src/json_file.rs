//! JSON file event store.
//!
//! The whole store is one JSON object keyed by ISO date. Every read parses a
//! complete snapshot of the file; every write replaces the file atomically.

use std::io::ErrorKind;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use dayplan_core::Event;
use tracing::{debug, info};

use crate::buckets::{DayBuckets, StoredRecord};
use crate::error::StoreError;
use crate::EventStore;

/// Event store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every bucket. A missing file is an empty store.
    pub fn load(&self) -> Result<DayBuckets, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Event file not found, treating as empty");
                return Ok(DayBuckets::new());
            }
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(DayBuckets::new());
        }

        let document: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", self.path.display(), e)))?;
        DayBuckets::from_document(document).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "{}: top level is not a day map",
                self.path.display()
            ))
        })
    }

    /// Replace the file with `buckets`, via a temporary sibling and a rename.
    pub fn save(&self, buckets: &DayBuckets) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&buckets.to_document())?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl EventStore for JsonFileStore {
    fn read(&self, days: RangeInclusive<NaiveDate>) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.load()?.select(days))
    }

    fn apply(&self, to_add: &[Event], to_remove: &[Event]) -> Result<(), StoreError> {
        let mut buckets = self.load()?;
        buckets.merge(to_add, to_remove)?;
        self.save(&buckets)?;
        info!(
            path = %self.path.display(),
            added = to_add.len(),
            removed = to_remove.len(),
            total = buckets.len(),
            "Event file updated"
        );
        Ok(())
    }
}
