//! Calendar-day arithmetic shared by expansion and scoring.
//!
//! Every day boundary in the system is computed here, in UTC. Expansion,
//! list queries, and both score calculators must agree on where a day starts
//! and ends or instances drift by one day at window edges; routing all
//! boundary math through this module is what keeps them aligned.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An inclusive calendar-day window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayWindow {
    /// Create a window, rejecting inverted bounds.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::Validation(format!(
                "window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window covering `[base, base + days]`.
    pub fn look_ahead(base: NaiveDate, days: i64) -> Self {
        Self {
            start: base,
            end: base + Days::new(days as u64),
        }
    }

    /// Single-day window.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Whether `day` falls inside the window.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// First instant of `day` (00:00:00 UTC).
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// First instant of the day after `day`. Used as an exclusive upper bound.
pub fn day_end(day: NaiveDate) -> DateTime<Utc> {
    day_start(day + Days::new(1))
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(day.weekday().num_days_from_monday() as u64)
}

/// Whole days from `base` until `deadline` (negative when overdue).
pub fn days_left(deadline: NaiveDate, base: NaiveDate) -> i64 {
    (deadline - base).num_days()
}
