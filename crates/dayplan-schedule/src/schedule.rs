//! The in-memory working set of committed events.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use dayplan_core::{Event, EventKey};

/// Ordered collection of events, indexed by [`EventKey`].
///
/// Iteration follows insertion order. Removal goes through the key index,
/// never through object identity, because evicted events reach the
/// scheduler as independent copies read back from the store. Pushing an
/// event whose key is already present replaces the older entry.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    entries: BTreeMap<u64, Event>,
    index: HashMap<EventKey, u64>,
    next_seq: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, replacing any entry with the same key.
    pub fn push(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(key) = event.key() {
            if let Some(old) = self.index.insert(key, seq) {
                self.entries.remove(&old);
            }
        }
        self.entries.insert(seq, event);
    }

    /// Remove the entry with `key`, if present.
    pub fn remove(&mut self, key: &EventKey) -> Option<Event> {
        let seq = self.index.remove(key)?;
        self.entries.remove(&seq)
    }

    pub fn contains_key(&self, key: &EventKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.values()
    }

    /// Events filed under `date`.
    pub fn on_day(&self, date: NaiveDate) -> impl Iterator<Item = &Event> {
        self.iter().filter(move |e| e.date == Some(date))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.entries.into_values().collect()
    }
}

impl FromIterator<Event> for Schedule {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut schedule = Schedule::new();
        for event in iter {
            schedule.push(event);
        }
        schedule
    }
}

impl From<Vec<Event>> for Schedule {
    fn from(events: Vec<Event>) -> Self {
        events.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_push_preserves_order() {
        let schedule: Schedule = vec![
            Event::chore("B", day(4), 30).with_id("b"),
            Event::chore("A", day(4), 30).with_id("a"),
            Event::todo("C", 30),
        ]
        .into();
        let names: Vec<_> = schedule.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_remove_by_key() {
        let mut schedule: Schedule = vec![
            Event::chore("A", day(4), 30).with_id("a"),
            Event::chore("B", day(4), 30).with_id("b"),
        ]
        .into();

        let removed = schedule.remove(&EventKey::Id("a".to_string())).unwrap();
        assert_eq!(removed.summary, "A");
        assert_eq!(schedule.len(), 1);
        assert!(schedule.remove(&EventKey::Id("a".to_string())).is_none());
    }

    #[test]
    fn test_push_same_key_replaces() {
        let mut schedule = Schedule::new();
        schedule.push(Event::chore("Old", day(4), 30).with_id("x"));
        schedule.push(Event::chore("Other", day(4), 30).with_id("y"));
        schedule.push(Event::chore("New", day(5), 30).with_id("x"));

        let names: Vec<_> = schedule.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(names, vec!["Other", "New"]);
    }

    #[test]
    fn test_keyless_events_never_collide() {
        // Two unplaced todos without ids must both survive.
        let schedule: Schedule = vec![Event::todo("Read", 30), Event::todo("Read", 30)].into();
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn test_slot_key_removal() {
        let call = Event::timed("Call", ts("2025-03-04T09:00:00-05:00"), ts("2025-03-04T09:30:00-05:00"));
        let key = call.key().unwrap();
        let mut schedule: Schedule = vec![call].into();
        assert!(schedule.contains_key(&key));
        assert!(schedule.remove(&key).is_some());
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_on_day_filters_by_date() {
        let schedule: Schedule = vec![
            Event::chore("Mon", day(3), 30),
            Event::chore("Tue", day(4), 30),
            Event::todo("Undated", 30),
        ]
        .into();
        let names: Vec<_> = schedule.on_day(day(4)).map(|e| e.summary.as_str()).collect();
        assert_eq!(names, vec!["Tue"]);
        assert_eq!(schedule.into_events().len(), 3);
    }
}
