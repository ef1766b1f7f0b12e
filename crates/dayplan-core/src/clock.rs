//! Source of "today" for horizon-based placement.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Supplies the current calendar date in a given zone.
pub trait Clock: Send + Sync {
    fn today(&self, tz: &Tz) -> NaiveDate;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self, tz: &Tz) -> NaiveDate {
        Utc::now().with_timezone(tz).date_naive()
    }
}

/// A clock pinned to one date, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self, _tz: &Tz) -> NaiveDate {
        self.0
    }
}
