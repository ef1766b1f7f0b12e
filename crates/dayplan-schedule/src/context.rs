//! Zone and working-window settings shared by the placement components.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use dayplan_core::config::ScheduleConfig;

/// Where and when chores and todos may be placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleContext {
    /// Reference zone for windows and overlap tests.
    pub tz: Tz,
    /// Local start of the working window (inclusive).
    pub day_start: NaiveTime,
    /// Local end of the working window (exclusive).
    pub day_end: NaiveTime,
    /// Days a todo is searched over, today included.
    pub horizon_days: u32,
}

impl Default for ScheduleContext {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::Toronto,
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            day_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
            horizon_days: 7,
        }
    }
}

impl ScheduleContext {
    /// Default window and horizon in another zone.
    pub fn in_zone(tz: Tz) -> Self {
        Self {
            tz,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> dayplan_core::Result<Self> {
        let (day_start, day_end) = config.window()?;
        Ok(Self {
            tz: config.timezone()?,
            day_start,
            day_end,
            horizon_days: config.todo_horizon_days,
        })
    }

    /// The working window of `date` as zoned instants.
    ///
    /// `None` when either bound does not exist on that date, such as a
    /// window edge falling into a daylight-saving gap.
    pub fn window(&self, date: NaiveDate) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let start = self.at(date, self.day_start)?;
        let end = self.at(date, self.day_end)?;
        Some((start, end))
    }

    /// Express `dt` in the reference zone.
    pub fn localize(&self, dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        dt.with_timezone(&self.tz).fixed_offset()
    }

    /// Calendar date of `dt` in the reference zone.
    pub fn local_date(&self, dt: DateTime<FixedOffset>) -> NaiveDate {
        dt.with_timezone(&self.tz).date_naive()
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<FixedOffset>> {
        self.tz
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.fixed_offset())
    }
}
