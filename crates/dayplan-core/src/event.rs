//! Event data model.
//!
//! An [`Event`] is one calendar item in one of three kinds: a timed event
//! with a fixed interval, a dated chore that still needs a slot, or an
//! undated todo. Loosely-shaped input arrives as an [`EventRecord`] and is
//! turned into an `Event` exactly once, by [`Event::from_record`].

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Slot size used when a record carries no duration.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Calendar name used when a record carries none.
pub const DEFAULT_CALENDAR: &str = "primary";

// =============================================================================
// Enums
// =============================================================================

/// The three scheduling kinds of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Fixed start and end; never moved by the scheduler.
    Timed,
    /// Has a date, gets a slot inside that day's working window.
    Chore,
    /// Has neither date nor time, gets a slot within the rolling horizon.
    Todo,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Timed => write!(f, "timed"),
            EventKind::Chore => write!(f, "chore"),
            EventKind::Todo => write!(f, "todo"),
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = EventError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timed" => Ok(EventKind::Timed),
            "chore" => Ok(EventKind::Chore),
            "todo" => Ok(EventKind::Todo),
            _ => Err(EventError::UnknownKind(s.to_string())),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Loosely-shaped event record as it appears in stores and batch files.
///
/// Every field is optional and unknown keys are ignored. Nothing here is
/// trusted until it passes through [`Event::from_record`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    /// Minutes. Remote calendars report fractional values, so this is a float.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "calendar_name")]
    pub calendar_name: Option<String>,
    #[serde(default, alias = "event_type")]
    pub event_type: Option<String>,
}

/// Identity used to deduplicate and evict events.
///
/// Persisted events carry a remote id. Events that never got one are
/// identified by their summary and start instead; an event with neither has
/// no key and can never be matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKey {
    Id(String),
    Slot {
        summary: String,
        start: DateTime<Utc>,
    },
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Id(id) => write!(f, "id:{}", id),
            EventKey::Slot { summary, start } => write!(f, "slot:{}@{}", summary, start.to_rfc3339()),
        }
    }
}

// =============================================================================
// Event
// =============================================================================

/// A single calendar item.
///
/// Serializes to the persisted record layout (`calendarName`, `eventType`,
/// RFC 3339 timestamps, `null` for absent values).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Option<String>,
    pub summary: String,
    pub date: Option<NaiveDate>,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    /// Slot size in minutes.
    pub duration: u32,
    pub location: String,
    pub description: String,
    pub calendar_name: String,
    #[serde(rename = "eventType")]
    pub kind: EventKind,
}

impl Event {
    /// A fixed-time event. The date is taken from `start` in the offset it
    /// carries; placement itself compares intervals, not dates.
    pub fn timed(
        summary: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        let minutes = (end - start).num_minutes().max(0);
        Self {
            date: Some(start.date_naive()),
            start: Some(start),
            end: Some(end),
            duration: u32::try_from(minutes).unwrap_or(u32::MAX),
            ..Self::blank(summary, EventKind::Timed)
        }
    }

    /// An unplaced chore for `date`.
    pub fn chore(summary: impl Into<String>, date: NaiveDate, duration: u32) -> Self {
        Self {
            date: Some(date),
            duration,
            ..Self::blank(summary, EventKind::Chore)
        }
    }

    /// An unplaced, undated todo.
    pub fn todo(summary: impl Into<String>, duration: u32) -> Self {
        Self {
            duration,
            ..Self::blank(summary, EventKind::Todo)
        }
    }

    fn blank(summary: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: None,
            summary: summary.into(),
            date: None,
            start: None,
            end: None,
            duration: DEFAULT_DURATION_MINUTES,
            location: String::new(),
            description: String::new(),
            calendar_name: DEFAULT_CALENDAR.to_string(),
            kind,
        }
    }

    /// Attach a stable identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Build an event from a loosely-shaped record.
    ///
    /// Timestamps without an offset are read as local time in `tz`; all
    /// timestamps are normalized to `tz` so that dates and overlap tests
    /// agree regardless of the offset a store persisted.
    pub fn from_record(record: EventRecord, tz: &Tz) -> Result<Self, EventError> {
        let start = parse_timestamp("start", record.start.as_deref(), tz)?;
        let end = parse_timestamp("end", record.end.as_deref(), tz)?;

        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                return Err(EventError::InvalidInterval {
                    start: s.to_rfc3339(),
                    end: e.to_rfc3339(),
                });
            }
        }

        let duration = match (record.duration, start, end) {
            (Some(minutes), _, _) => duration_minutes(minutes)?,
            (None, Some(s), Some(e)) => {
                u32::try_from((e - s).num_minutes()).unwrap_or(DEFAULT_DURATION_MINUTES)
            }
            _ => DEFAULT_DURATION_MINUTES,
        };

        // An end on its own describes no slot.
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) => (Some(s), Some(e)),
            (Some(s), None) => (Some(s), Some(s + Duration::minutes(i64::from(duration)))),
            _ => (None, None),
        };

        // A slot fixes the day in `tz`; the stored date only applies to slotless records.
        let date = match (start, record.date.as_deref().map(str::trim).filter(|d| !d.is_empty())) {
            (Some(s), _) => Some(s.date_naive()),
            (None, Some(raw)) => Some(parse_date(raw)?),
            (None, None) => None,
        };
        if start.is_none() && duration == 0 {
            return Err(EventError::InvalidDuration("0".to_string()));
        }

        let declared = record
            .event_type
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(str::parse::<EventKind>)
            .transpose()?;

        Ok(Self {
            id: record.id.filter(|id| !id.is_empty()),
            summary: record.summary.unwrap_or_default(),
            date,
            start,
            end,
            duration,
            location: record.location.unwrap_or_default(),
            description: record.description.unwrap_or_default(),
            calendar_name: record
                .calendar_name
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CALENDAR.to_string()),
            kind: classify(declared, date.is_some(), start.is_some()),
        })
    }

    /// Parse a JSON value into an event via [`EventRecord`].
    pub fn from_json(value: serde_json::Value, tz: &Tz) -> Result<Self, crate::DayplanError> {
        let record: EventRecord = serde_json::from_value(value)?;
        Ok(Self::from_record(record, tz)?)
    }

    /// Whether the event occupies a concrete interval.
    pub fn is_placed(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// The occupied interval, if any.
    pub fn interval(&self) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        match (self.start, self.end) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => None,
        }
    }

    /// Half-open overlap test: touching intervals do not overlap.
    pub fn overlaps(&self, start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> bool {
        match self.interval() {
            Some((s, e)) => s < *end && e > *start,
            None => false,
        }
    }

    /// The slot length as a chrono duration.
    pub fn slot_length(&self) -> Duration {
        Duration::minutes(i64::from(self.duration))
    }

    /// Occupy `[start, start + duration)`. The date follows the start.
    pub fn place_at(&mut self, start: DateTime<FixedOffset>) {
        self.end = Some(start + self.slot_length());
        self.start = Some(start);
        self.date = Some(start.date_naive());
    }

    /// Drop the occupied slot. A todo also loses its date.
    pub fn clear_slot(&mut self) {
        self.start = None;
        self.end = None;
        if self.kind == EventKind::Todo {
            self.date = None;
        }
    }

    /// Identity for deduplication and eviction.
    pub fn key(&self) -> Option<EventKey> {
        if let Some(id) = &self.id {
            return Some(EventKey::Id(id.clone()));
        }
        self.start.map(|start| EventKey::Slot {
            summary: self.summary.clone(),
            start: start.with_timezone(&Utc),
        })
    }
}

/// Decide the kind of an event.
///
/// Without a slot the shape decides: dated means chore, undated means todo.
/// With a slot the declared kind stands, so a placed chore stays a chore.
fn classify(declared: Option<EventKind>, has_date: bool, has_slot: bool) -> EventKind {
    match (has_slot, declared) {
        (true, Some(kind)) => kind,
        (true, None) => EventKind::Timed,
        (false, _) if has_date => EventKind::Chore,
        (false, _) => EventKind::Todo,
    }
}

fn parse_timestamp(
    field: &'static str,
    raw: Option<&str>,
    tz: &Tz,
) -> Result<Option<DateTime<FixedOffset>>, EventError> {
    let raw = match raw.map(str::trim) {
        // A bare date carries no time of day.
        Some(s) if s.contains('T') => s,
        _ => return Ok(None),
    };
    let invalid = || EventError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(tz).fixed_offset()));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| invalid())?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| Some(dt.fixed_offset()))
        .ok_or_else(invalid)
}

fn parse_date(raw: &str) -> Result<NaiveDate, EventError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| EventError::InvalidDate(raw.to_string()))
}

fn duration_minutes(minutes: f64) -> Result<u32, EventError> {
    if !minutes.is_finite() || minutes < 0.0 || minutes > f64::from(u32::MAX) {
        return Err(EventError::InvalidDuration(minutes.to_string()));
    }
    Ok(minutes.round() as u32)
}
