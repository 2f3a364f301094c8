//! Instance expansion: materializing concrete occurrences of recurring items
//! inside a query window.
//!
//! The walk always starts at the item's anchor day so interval and
//! day-of-month arithmetic stays exact, and is capped at the earlier of the
//! window end and the rule's own end date. Output is bounded below by the
//! window (todos) or by interval intersection (schedules).

use chrono::{Days, NaiveDate};

use crate::models::{Schedule, ScheduleInstance, Todo};
use crate::recurrence::Recurrence;
use crate::temporal::{day_end, day_start, DayWindow};

/// Lazy, finite walk over the occurrence days of a rule.
///
/// Restartable: cloning yields an independent iterator at the same position,
/// and re-invoking the factory restarts from the anchor.
#[derive(Debug, Clone)]
pub struct OccurrenceDays {
    rule: Recurrence,
    anchor: NaiveDate,
    cursor: NaiveDate,
    until: NaiveDate,
}

impl OccurrenceDays {
    fn empty(day: NaiveDate) -> Self {
        Self {
            rule: Recurrence::None,
            anchor: day,
            cursor: day,
            until: day - Days::new(1),
        }
    }
}

impl Iterator for OccurrenceDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        while self.cursor <= self.until {
            let day = self.cursor;
            self.cursor = day + Days::new(1);
            if self.rule.matches(self.anchor, day) {
                return Some(day);
            }
        }
        None
    }
}

/// Occurrence days of `rule` anchored at `anchor`, up to `until` inclusive,
/// further capped by the rule's own end date.
pub fn occurrence_days(anchor: NaiveDate, rule: &Recurrence, until: NaiveDate) -> OccurrenceDays {
    let until = match rule.end_date() {
        Some(end) => until.min(end),
        None => until,
    };
    if !rule.is_recurring() || until < anchor {
        return OccurrenceDays::empty(anchor);
    }
    OccurrenceDays {
        rule: rule.clone(),
        anchor,
        cursor: anchor,
        until,
    }
}

/// Expand a recurring todo into per-day instances inside `window`.
///
/// Yields nothing for non-recurring or undated todos; those flow through the
/// one-off query path instead.
pub fn expand_todo(todo: &Todo, window: DayWindow) -> impl Iterator<Item = Todo> + '_ {
    let days = match todo.date {
        Some(anchor) => occurrence_days(anchor, &todo.repeat, window.end),
        None => OccurrenceDays::empty(window.start),
    };
    days.filter(move |day| *day >= window.start)
        .map(move |day| todo.occurrence_on(day))
}

/// Expand a recurring schedule into concrete intervals intersecting `window`.
///
/// The day walk is not clamped below the window start: a multi-day occurrence
/// anchored before the window can still reach into it.
pub fn expand_schedule(
    schedule: &Schedule,
    window: DayWindow,
) -> impl Iterator<Item = ScheduleInstance> + '_ {
    let lo = day_start(window.start);
    let hi = day_end(window.end);
    occurrence_days(schedule.anchor_day(), &schedule.repeat, window.end).filter_map(move |day| {
        let (start_at, end_at) = schedule.occurrence_interval(day);
        (start_at < hi && end_at >= lo).then(|| ScheduleInstance {
            schedule: schedule.clone(),
            start_at,
            end_at,
        })
    })
}

/// Whether a non-recurring todo belongs in the list for `day`:
/// dated todos on their day, deadline-only todos while the deadline has not
/// passed.
pub fn one_off_todo_due_on(todo: &Todo, day: NaiveDate) -> bool {
    match (todo.date, todo.deadline) {
        (Some(date), None) => date == day,
        (None, Some(deadline)) => deadline >= day,
        _ => false,
    }
}

/// Whether a non-recurring schedule's interval intersects the window.
pub fn one_off_schedule_overlaps(schedule: &Schedule, window: DayWindow) -> bool {
    schedule.start_at < day_end(window.end) && schedule.end_at >= day_start(window.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn w(start: &str, end: &str) -> DayWindow {
        DayWindow::new(d(start), d(end)).unwrap()
    }

    fn recurring_todo(anchor: &str, repeat: Recurrence) -> Todo {
        Todo {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            project: None,
            category: Uuid::new_v4(),
            title: "recurring".to_string(),
            date: Some(d(anchor)),
            deadline: None,
            difficulty: None,
            completed: false,
            repeat,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn recurring_schedule(start: &str, end: &str, repeat: Recurrence) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            project: None,
            category: Uuid::new_v4(),
            title: "meeting".to_string(),
            start_at: start.parse::<DateTime<Utc>>().unwrap(),
            end_at: end.parse::<DateTime<Utc>>().unwrap(),
            repeat,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_daily_interval_two_yields_alternate_days() {
        let todo = recurring_todo(
            "2024-01-01",
            Recurrence::Daily {
                interval: 2,
                end_date: None,
            },
        );
        let days: Vec<NaiveDate> = expand_todo(&todo, w("2024-01-01", "2024-01-10"))
            .map(|t| t.date.unwrap())
            .collect();
        assert_eq!(
            days,
            vec![
                d("2024-01-01"),
                d("2024-01-03"),
                d("2024-01-05"),
                d("2024-01-07"),
                d("2024-01-09"),
            ]
        );
    }

    #[test]
    fn test_walk_starts_at_anchor_so_modular_math_is_window_independent() {
        let todo = recurring_todo(
            "2024-01-01",
            Recurrence::Daily {
                interval: 3,
                end_date: None,
            },
        );
        // Window starts mid-cycle; occurrences stay on the anchor's grid.
        let days: Vec<NaiveDate> = expand_todo(&todo, w("2024-01-05", "2024-01-12"))
            .map(|t| t.date.unwrap())
            .collect();
        assert_eq!(days, vec![d("2024-01-07"), d("2024-01-10")]);
    }

    #[test]
    fn test_weekly_instances_stay_on_listed_weekdays() {
        let todo = recurring_todo(
            "2024-01-01",
            Recurrence::Weekly {
                week_days: vec![1, 3],
                end_date: Some(d("2024-01-15")),
            },
        );
        let days: Vec<NaiveDate> = expand_todo(&todo, w("2024-01-01", "2024-01-31"))
            .map(|t| t.date.unwrap())
            .collect();
        assert!(!days.is_empty());
        for day in &days {
            use chrono::Datelike;
            let dow = day.weekday().num_days_from_sunday() as u8;
            assert!(dow == 1 || dow == 3, "weekday {dow} not in rule");
            assert!(*day <= d("2024-01-15"), "{day} is past the rule end");
        }
        assert_eq!(*days.last().unwrap(), d("2024-01-15")); // a Monday
    }

    #[test]
    fn test_monthly_skips_months_without_anchor_day() {
        let todo = recurring_todo("2024-01-31", Recurrence::Monthly { end_date: None });
        let days: Vec<NaiveDate> = expand_todo(&todo, w("2024-01-01", "2024-05-31"))
            .map(|t| t.date.unwrap())
            .collect();
        assert_eq!(
            days,
            vec![d("2024-01-31"), d("2024-03-31"), d("2024-05-31")]
        );
    }

    #[test]
    fn test_anchor_after_window_yields_nothing() {
        let todo = recurring_todo(
            "2024-06-01",
            Recurrence::Daily {
                interval: 1,
                end_date: None,
            },
        );
        assert_eq!(expand_todo(&todo, w("2024-01-01", "2024-01-31")).count(), 0);
    }

    #[test]
    fn test_non_recurring_todo_expands_to_nothing() {
        let mut todo = recurring_todo("2024-01-01", Recurrence::None);
        assert_eq!(expand_todo(&todo, w("2024-01-01", "2024-01-10")).count(), 0);
        todo.date = None;
        assert_eq!(expand_todo(&todo, w("2024-01-01", "2024-01-10")).count(), 0);
    }

    #[test]
    fn test_occurrence_days_is_restartable() {
        let rule = Recurrence::Daily {
            interval: 2,
            end_date: None,
        };
        let iter = occurrence_days(d("2024-01-01"), &rule, d("2024-01-06"));
        let first: Vec<NaiveDate> = iter.clone().collect();
        let second: Vec<NaiveDate> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![d("2024-01-01"), d("2024-01-03"), d("2024-01-05")]);
    }

    #[test]
    fn test_schedule_instances_carry_anchor_time_and_duration() {
        let sched = recurring_schedule(
            "2024-01-01T09:30:00Z",
            "2024-01-01T10:15:00Z",
            Recurrence::Daily {
                interval: 1,
                end_date: None,
            },
        );
        let instances: Vec<ScheduleInstance> =
            expand_schedule(&sched, w("2024-01-03", "2024-01-04")).collect();
        assert_eq!(instances.len(), 2);
        assert_eq!(
            instances[0].start_at,
            "2024-01-03T09:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(
            (instances[0].end_at - instances[0].start_at).num_minutes(),
            45
        );
    }

    #[test]
    fn test_multiday_schedule_occurrence_before_window_still_reaches_in() {
        // Weekly Monday occurrence spanning 48h; window covers only Tuesday.
        let sched = recurring_schedule(
            "2024-01-01T12:00:00Z",
            "2024-01-03T12:00:00Z",
            Recurrence::Weekly {
                week_days: vec![1],
                end_date: None,
            },
        );
        let instances: Vec<ScheduleInstance> =
            expand_schedule(&sched, w("2024-01-09", "2024-01-09")).collect();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].start_at.date_naive(), d("2024-01-08"));
    }

    #[test]
    fn test_one_off_todo_due_on() {
        let mut todo = recurring_todo("2024-01-05", Recurrence::None);
        assert!(one_off_todo_due_on(&todo, d("2024-01-05")));
        assert!(!one_off_todo_due_on(&todo, d("2024-01-06")));

        todo.date = None;
        todo.deadline = Some(d("2024-01-10"));
        assert!(one_off_todo_due_on(&todo, d("2024-01-05")));
        assert!(one_off_todo_due_on(&todo, d("2024-01-10")));
        assert!(!one_off_todo_due_on(&todo, d("2024-01-11")));
    }

    #[test]
    fn test_one_off_schedule_overlap_is_inclusive_of_window_days() {
        let sched = recurring_schedule(
            "2024-01-05T23:00:00Z",
            "2024-01-06T01:00:00Z",
            Recurrence::None,
        );
        assert!(one_off_schedule_overlaps(&sched, w("2024-01-06", "2024-01-07")));
        assert!(one_off_schedule_overlaps(&sched, w("2024-01-05", "2024-01-05")));
        assert!(!one_off_schedule_overlaps(&sched, w("2024-01-07", "2024-01-08")));
    }
}
