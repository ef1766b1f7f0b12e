//! End-to-end reconciliation scenarios against in-memory and file stores.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use dayplan_core::{Event, EventKind, FixedClock};
use dayplan_schedule::{FailureReason, Reconciliation, Schedule, ScheduleContext, Scheduler};
use dayplan_store::{EventStore, InMemoryStore, JsonFileStore};

fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn at(d: u32, hm: &str) -> DateTime<FixedOffset> {
    ts(&format!("2025-03-{:02}T{}:00-05:00", d, hm))
}

fn placed_chore(id: &str, d: u32, hm: &str, minutes: u32) -> Event {
    let mut chore = Event::chore(id, day(d), minutes).with_id(id);
    chore.place_at(at(d, hm));
    chore
}

fn run(store: Arc<dyn EventStore>, batch: Vec<Event>, schedule: Schedule) -> Reconciliation {
    Scheduler::with_clock(store, ScheduleContext::default(), Arc::new(FixedClock(day(3))))
        .reconcile(batch, schedule)
}

fn empty_store() -> Arc<dyn EventStore> {
    Arc::new(InMemoryStore::new())
}

fn start_of(result: &Reconciliation, summary: &str) -> Option<String> {
    result
        .to_add
        .iter()
        .find(|e| e.summary == summary)
        .and_then(|e| e.start)
        .map(|s| s.to_rfc3339())
}

#[test]
fn test_chore_on_empty_day_starts_at_window_open() {
    let result = run(empty_store(), vec![Event::chore("Clean", day(4), 90)], Schedule::new());

    let chore = &result.to_add[0];
    assert_eq!(chore.start, Some(at(4, "08:00")));
    assert_eq!(chore.end, Some(at(4, "09:30")));
    assert!(result.unplaced.is_empty());
}

#[test]
fn test_chore_fills_gap_before_existing_block() {
    let block = placed_chore("Ironing", 4, "09:00", 60);
    let result = run(empty_store(), vec![Event::chore("Dishes", day(4), 60)], vec![block].into());
    assert_eq!(start_of(&result, "Dishes").as_deref(), Some("2025-03-04T08:00:00-05:00"));
}

#[test]
fn test_chore_on_full_day_is_returned_unplaced() {
    let block = placed_chore("Spring cleaning", 4, "08:00", 12 * 60);
    let result = run(empty_store(), vec![Event::chore("Dishes", day(4), 15)], vec![block].into());

    let chore = &result.to_add[0];
    assert!(chore.start.is_none() && chore.end.is_none());
    assert_eq!(result.unplaced.len(), 1);
    assert_eq!(
        result.unplaced[0].reason,
        FailureReason::NoSlotInWindow {
            date: day(4),
            duration: 15
        }
    );
}

#[test]
fn test_timed_event_evicts_colliding_chore_which_is_placed_again() {
    let chore = placed_chore("c", 4, "10:00", 60);
    let store = Arc::new(InMemoryStore::with_events(&[chore.clone()]).unwrap());

    let meeting = Event::timed("Meeting", at(4, "10:30"), at(4, "11:30"));
    let result = run(store, vec![meeting.clone()], vec![chore.clone()].into());

    assert_eq!(result.to_remove, vec![chore]);
    assert_eq!(result.to_add.len(), 2);
    assert_eq!(result.to_add[0], meeting);

    let replaced = &result.to_add[1];
    assert_eq!(replaced.kind, EventKind::Chore);
    assert!(replaced.id.is_none());
    assert_eq!(replaced.start, Some(at(4, "08:00")));
    assert_eq!(replaced.end, Some(at(4, "09:00")));

    // The old slot is gone from the schedule; the meeting and new slot remain.
    let summaries: Vec<_> = result.schedule.iter().map(|e| e.summary.as_str()).collect();
    assert_eq!(summaries, vec!["Meeting", "c"]);
}

#[test]
fn test_adjacent_timed_event_does_not_evict() {
    let chore = placed_chore("c", 4, "10:00", 60);
    let store = Arc::new(InMemoryStore::with_events(&[chore.clone()]).unwrap());

    let meeting = Event::timed("Meeting", at(4, "11:00"), at(4, "12:00"));
    let result = run(store, vec![meeting], vec![chore].into());

    assert!(result.to_remove.is_empty());
    assert_eq!(result.to_add.len(), 1);
}

#[test]
fn test_timed_event_is_kept_even_when_it_overlaps_another() {
    let existing = Event::timed("Dentist", at(4, "10:00"), at(4, "11:00")).with_id("d");
    let store = Arc::new(InMemoryStore::with_events(&[existing.clone()]).unwrap());

    let clash = Event::timed("Call", at(4, "10:15"), at(4, "10:45"));
    let result = run(store, vec![clash.clone()], vec![existing].into());

    assert!(result.to_remove.is_empty());
    assert_eq!(result.to_add, vec![clash]);
}

#[test]
fn test_todo_goes_to_first_day_with_room() {
    let busy: Schedule = vec![Event::timed("Busy", at(3, "08:00"), at(3, "20:00")).with_id("b")].into();
    let result = run(empty_store(), vec![Event::todo("Read", 45)], busy);

    let todo = &result.to_add[0];
    assert_eq!(todo.date, Some(day(4)));
    assert_eq!(todo.start, Some(at(4, "08:00")));
}

#[test]
fn test_todo_with_every_horizon_day_full_stays_unplaced() {
    let schedule: Schedule = (3..=9)
        .map(|d| Event::timed("Busy", at(d, "08:00"), at(d, "20:00")).with_id(format!("b{}", d)))
        .collect();
    let result = run(empty_store(), vec![Event::todo("Read", 30)], schedule);

    let todo = &result.to_add[0];
    assert!(todo.date.is_none());
    assert!(todo.start.is_none());
    assert_eq!(
        result.unplaced[0].reason,
        FailureReason::HorizonExhausted {
            from: day(3),
            days: 7,
            duration: 30
        }
    );
}

#[test]
fn test_empty_batch_leaves_schedule_untouched() {
    let existing: Schedule = vec![
        placed_chore("a", 4, "08:00", 30),
        Event::timed("Lunch", at(4, "12:00"), at(4, "13:00")).with_id("l"),
    ]
    .into();
    let before: Vec<Event> = existing.iter().cloned().collect();

    let result = run(empty_store(), Vec::new(), existing);

    assert!(result.to_add.is_empty());
    assert!(result.to_remove.is_empty());
    assert!(result.unplaced.is_empty());
    assert_eq!(result.schedule.into_events(), before);
}

#[test]
fn test_same_inputs_give_same_outputs() {
    let batch = || {
        vec![
            Event::todo("Read", 40),
            Event::chore("Laundry", day(4), 90),
            Event::timed("Meeting", at(4, "10:30"), at(4, "11:30")),
            Event::chore("Dishes", day(4), 20),
        ]
    };
    let stored = || {
        Arc::new(InMemoryStore::with_events(&[placed_chore("c", 4, "10:00", 60)]).unwrap())
            as Arc<dyn EventStore>
    };
    let schedule = || Schedule::from(vec![placed_chore("c", 4, "10:00", 60)]);

    let first = run(stored(), batch(), schedule());
    let second = run(stored(), batch(), schedule());

    assert_eq!(first.to_add, second.to_add);
    assert_eq!(first.to_remove, second.to_remove);
    assert_eq!(first.unplaced, second.unplaced);
}

#[test]
fn test_placed_chores_never_double_book_and_stay_in_window() {
    let schedule: Schedule = vec![
        Event::timed("A", at(4, "09:10"), at(4, "10:00")).with_id("a"),
        Event::timed("B", at(4, "13:00"), at(4, "14:30")).with_id("b"),
        Event::timed("Evening", at(4, "19:45"), at(4, "21:00")).with_id("e"),
    ]
    .into();
    let batch: Vec<Event> = [70, 45, 120, 30, 95, 60, 25, 180, 240]
        .iter()
        .enumerate()
        .map(|(i, minutes)| Event::chore(format!("chore-{}", i), day(4), *minutes))
        .collect();

    let result = run(empty_store(), batch, schedule);

    let window_open = at(4, "08:00");
    let window_close = at(4, "20:00");
    let intervals: Vec<_> = result.schedule.on_day(day(4)).filter_map(Event::interval).collect();
    for (i, (start, end)) in intervals.iter().enumerate() {
        for (other_start, other_end) in intervals.iter().skip(i + 1) {
            assert!(
                end <= other_start || other_end <= start,
                "{}..{} overlaps {}..{}",
                start,
                end,
                other_start,
                other_end
            );
        }
    }
    for event in result.to_add.iter().filter(|e| e.is_placed()) {
        let (start, end) = event.interval().unwrap();
        assert!(start >= window_open && end <= window_close, "{} leaves the window", event.summary);
    }
    // Everything placed or reported, nothing dropped.
    assert_eq!(result.to_add.len(), 9);
    let unplaced_count = result.to_add.iter().filter(|e| !e.is_placed()).count();
    assert_eq!(unplaced_count, result.unplaced.len());
}

#[test]
fn test_exact_gap_fits_and_one_minute_more_does_not() {
    let schedule = || -> Schedule {
        vec![
            Event::timed("A", at(4, "08:00"), at(4, "12:00")).with_id("a"),
            Event::timed("B", at(4, "12:50"), at(4, "20:00")).with_id("b"),
        ]
        .into()
    };

    let fits = run(empty_store(), vec![Event::chore("Fits", day(4), 50)], schedule());
    assert_eq!(fits.to_add[0].start, Some(at(4, "12:00")));

    let too_long = run(empty_store(), vec![Event::chore("Too long", day(4), 51)], schedule());
    assert!(!too_long.to_add[0].is_placed());
}

#[test]
fn test_unavailable_store_is_treated_as_empty() {
    let store = Arc::new(InMemoryStore::with_events(&[placed_chore("c", 4, "10:00", 60)]).unwrap());
    store.set_unavailable(true);

    let meeting = Event::timed("Meeting", at(4, "10:30"), at(4, "11:30"));
    let result = run(store, vec![meeting], Schedule::new());

    assert!(result.to_remove.is_empty());
    assert_eq!(result.to_add.len(), 1);
}

#[test]
fn test_reconcile_and_apply_against_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("events.json"));
    let chore = placed_chore("c", 4, "10:00", 60);
    store.apply(&[chore.clone()], &[]).unwrap();

    let meeting = Event::timed("Meeting", at(4, "10:30"), at(4, "11:30")).with_id("m");
    let result = run(Arc::new(store.clone()), vec![meeting], vec![chore].into());
    store.apply(&result.to_add, &result.to_remove).unwrap();

    let tz = ScheduleContext::default().tz;
    let stored: Vec<Event> = store
        .read(day(4)..=day(4))
        .unwrap()
        .into_iter()
        .map(|r| Event::from_json(r.value, &tz).unwrap())
        .collect();

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].summary, "c");
    assert_eq!(stored[0].start, Some(at(4, "08:00")));
    assert_eq!(stored[1].id.as_deref(), Some("m"));
}

#[test]
fn test_timed_event_in_utc_blocks_local_evening() {
    let day_block = placed_chore("Day", 4, "08:00", 11 * 60 + 30);
    let store = Arc::new(InMemoryStore::new());
    let tz = ScheduleContext::default().tz;
    let late = Event::from_json(
        serde_json::json!({
            "id": "late",
            "summary": "Late call",
            "date": "2025-03-05",
            "start": "2025-03-05T00:30:00+00:00",
            "end": "2025-03-05T01:30:00+00:00"
        }),
        &tz,
    )
    .unwrap();
    assert_eq!(late.date, Some(day(4)));

    let batch = vec![
        Event::timed("Late UTC", ts("2025-03-05T00:30:00Z"), ts("2025-03-05T01:00:00Z")),
        Event::chore("Short", day(4), 30),
    ];
    let result = run(store, batch, vec![day_block, late].into());

    let chore = result.to_add.iter().find(|e| e.summary == "Short").unwrap();
    assert!(!chore.is_placed());
    assert_eq!(result.unplaced.len(), 1);
}
