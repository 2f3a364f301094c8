//! Recurrence rules: the repeating pattern attached to todos and schedules.
//!
//! A rule is a closed sum type with per-cadence required fields, validated at
//! construction time rather than interpreted by convention downstream.
//! Weekday numbering is days-from-Sunday (0 = Sunday .. 6 = Saturday), the
//! wire format clients already speak.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Repeating pattern for a recurring item.
///
/// `end_date` is an inclusive day bound on the series; `None` means the
/// series is unbounded. `Monthly` intentionally carries no interval: the
/// cadence is always one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recurrence {
    /// Not recurring.
    None,
    /// Every `interval` days from the anchor.
    Daily {
        interval: i32,
        #[serde(default)]
        end_date: Option<NaiveDate>,
    },
    /// On the listed weekdays (0 = Sunday .. 6 = Saturday).
    Weekly {
        week_days: Vec<u8>,
        #[serde(default)]
        end_date: Option<NaiveDate>,
    },
    /// On the anchor's day-of-month, every month.
    Monthly {
        #[serde(default)]
        end_date: Option<NaiveDate>,
    },
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence::None
    }
}

impl Recurrence {
    /// Whether this rule produces more than the anchor occurrence.
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::None)
    }

    /// The inclusive series end bound, if any.
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            Recurrence::None => None,
            Recurrence::Daily { end_date, .. }
            | Recurrence::Weekly { end_date, .. }
            | Recurrence::Monthly { end_date } => *end_date,
        }
    }

    /// Copy of this rule with the end bound replaced. `None` stays `None`.
    pub fn with_end_date(&self, end: Option<NaiveDate>) -> Recurrence {
        match self {
            Recurrence::None => Recurrence::None,
            Recurrence::Daily { interval, .. } => Recurrence::Daily {
                interval: *interval,
                end_date: end,
            },
            Recurrence::Weekly { week_days, .. } => Recurrence::Weekly {
                week_days: week_days.clone(),
                end_date: end,
            },
            Recurrence::Monthly { .. } => Recurrence::Monthly { end_date: end },
        }
    }

    /// Validate per-variant required fields against the item's anchor day.
    pub fn validate(&self, anchor: NaiveDate) -> Result<()> {
        match self {
            Recurrence::None => return Ok(()),
            Recurrence::Daily { interval, .. } => {
                if *interval < 1 {
                    return Err(Error::Validation(format!(
                        "daily interval must be >= 1, got {interval}"
                    )));
                }
            }
            Recurrence::Weekly { week_days, .. } => {
                if week_days.is_empty() {
                    return Err(Error::Validation(
                        "weekly rule requires at least one weekday".to_string(),
                    ));
                }
                if let Some(bad) = week_days.iter().find(|d| **d > 6) {
                    return Err(Error::Validation(format!(
                        "weekday {bad} is outside 0..=6"
                    )));
                }
            }
            Recurrence::Monthly { .. } => {}
        }
        if let Some(end) = self.end_date() {
            if end < anchor {
                return Err(Error::Validation(format!(
                    "recurrence end {end} precedes anchor {anchor}"
                )));
            }
        }
        Ok(())
    }

    /// Whether `candidate` is an occurrence day of a series anchored at `anchor`.
    ///
    /// The end bound is not consulted here; callers cap their walk instead.
    pub fn matches(&self, anchor: NaiveDate, candidate: NaiveDate) -> bool {
        match self {
            Recurrence::None => false,
            Recurrence::Daily { interval, .. } => {
                let diff = (candidate - anchor).num_days();
                diff >= 0 && *interval >= 1 && diff % (*interval as i64) == 0
            }
            Recurrence::Weekly { week_days, .. } => {
                let dow = candidate.weekday().num_days_from_sunday() as u8;
                week_days.contains(&dow)
            }
            Recurrence::Monthly { .. } => candidate.day() == anchor.day(),
        }
    }

    /// The next occurrence strictly after `date`.
    ///
    /// Weekly picks the smallest forward offset in 1..=7 landing on a listed
    /// weekday, falling back to a full week. Monthly adds one calendar month
    /// (chrono clamps when the day-of-month overflows, e.g. Jan 31 -> Feb 29).
    /// `None` returns `date` unchanged.
    pub fn next_occurrence_after(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Recurrence::None => date,
            Recurrence::Daily { interval, .. } => date + Days::new((*interval).max(1) as u64),
            Recurrence::Weekly { week_days, .. } => {
                let dow = date.weekday().num_days_from_sunday() as u8;
                let offset = week_days
                    .iter()
                    .map(|d| (d + 7 - dow) % 7)
                    .filter(|diff| *diff > 0)
                    .min()
                    .unwrap_or(7);
                date + Days::new(offset as u64)
            }
            Recurrence::Monthly { .. } => date.checked_add_months(Months::new(1)).unwrap_or(date),
        }
    }
}
