//! The persisted day-bucket layout.
//!
//! A store is a map from ISO date (`YYYY-MM-DD`) to the records of that day,
//! sorted by start time with unplaced records first. Events without any date
//! live in the reserved [`UNDATED_BUCKET`].

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, Utc};
use dayplan_core::{Event, EventKey};
use serde_json::Value;
use tracing::warn;

/// Bucket for events that have no date.
pub const UNDATED_BUCKET: &str = "todo";

/// One raw record together with the bucket it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub bucket: String,
    pub value: Value,
}

/// Day-keyed collection of raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBuckets(pub BTreeMap<String, Vec<Value>>);

impl DayBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret a whole JSON document. Buckets that are not arrays are
    /// dropped with a warning; records inside are kept as-is.
    pub fn from_document(document: Value) -> Option<Self> {
        let Value::Object(map) = document else {
            return None;
        };
        let mut buckets = BTreeMap::new();
        for (day, records) in map {
            match records {
                Value::Array(records) => {
                    buckets.insert(day, records);
                }
                other => warn!(bucket = %day, kind = json_kind(&other), "Skipping non-list bucket"),
            }
        }
        Some(Self(buckets))
    }

    pub fn to_document(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(day, records)| (day.clone(), Value::Array(records.clone())))
                .collect(),
        )
    }

    /// Records of every bucket within `days`, inclusive.
    pub fn select(&self, days: RangeInclusive<NaiveDate>) -> Vec<StoredRecord> {
        let (first, last) = days.into_inner();
        if first > last {
            return Vec::new();
        }
        let lower = first.format("%Y-%m-%d").to_string();
        let upper = last.format("%Y-%m-%d").to_string();
        self.0
            .range(lower..=upper)
            .flat_map(|(day, records)| {
                records.iter().map(move |value| StoredRecord {
                    bucket: day.clone(),
                    value: value.clone(),
                })
            })
            .collect()
    }

    /// Remove `to_remove` by key, then merge `to_add`.
    ///
    /// An added event replaces every stored record with the same key, in any
    /// bucket, so a moved event does not linger on its old day.
    pub fn merge(&mut self, to_add: &[Event], to_remove: &[Event]) -> Result<(), serde_json::Error> {
        for event in to_remove {
            if let Some(key) = event.key() {
                self.remove_key(&key);
            }
        }

        let mut touched = Vec::new();
        for event in to_add {
            if let Some(key) = event.key() {
                self.remove_key(&key);
            }
            let bucket = bucket_for(event);
            self.0
                .entry(bucket.clone())
                .or_default()
                .push(serde_json::to_value(event)?);
            touched.push(bucket);
        }

        for bucket in touched {
            if let Some(records) = self.0.get_mut(&bucket) {
                records.sort_by_key(record_start);
            }
        }
        self.0.retain(|_, records| !records.is_empty());
        Ok(())
    }

    fn remove_key(&mut self, key: &EventKey) {
        for records in self.0.values_mut() {
            records.retain(|record| record_key(record).as_ref() != Some(key));
        }
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bucket name an event is filed under.
pub fn bucket_for(event: &Event) -> String {
    match event.date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => UNDATED_BUCKET.to_string(),
    }
}

/// Key of a raw record, mirroring [`Event::key`].
pub fn record_key(record: &Value) -> Option<EventKey> {
    if let Some(id) = record.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()) {
        return Some(EventKey::Id(id.to_string()));
    }
    let summary = record.get("summary").and_then(Value::as_str).unwrap_or_default();
    record_start(record).map(|start| EventKey::Slot {
        summary: summary.to_string(),
        start,
    })
}

fn record_start(record: &Value) -> Option<DateTime<Utc>> {
    record
        .get("start")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
