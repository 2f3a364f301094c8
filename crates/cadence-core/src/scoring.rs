//! Pure scoring math shared by the busyness and bonus calculators.
//!
//! Both calculators gather their own item sets (see cadence-jobs); the
//! arithmetic over a gathered set lives here so it can be tested without
//! storage.

use chrono::{NaiveDate, Utc};

use crate::defaults::{
    DATE_ONLY_BONUS, DEADLINE_BASE_SCORE, DEADLINE_DECAY_PER_DAY, OVERDUE_WEIGHT,
};
use crate::models::{BusynessBreakdown, Todo};
use crate::temporal::days_left;

/// Deadline-proximity weight: full base score at zero days of slack,
/// decaying per remaining day, floored at zero. Overdue days push it past
/// the base.
fn deadline_weight(left: i64) -> i64 {
    (DEADLINE_BASE_SCORE - left * DEADLINE_DECAY_PER_DAY).max(0)
}

/// Fold a gathered item set into a busyness breakdown relative to `base_day`.
///
/// Deadline items count toward deadline/overdue/weighted buckets (the latter
/// two only while incomplete); date-only items count as scheduled. Every item
/// contributes its difficulty.
pub fn breakdown_from_todos<'a, I>(todos: I, base_day: NaiveDate) -> BusynessBreakdown
where
    I: IntoIterator<Item = &'a Todo>,
{
    let mut scheduled_count = 0;
    let mut deadline_count = 0;
    let mut overdue_count = 0;
    let mut weighted_deadline_score = 0;
    let mut total_difficulty_score = 0;

    for todo in todos {
        total_difficulty_score += todo.difficulty_or_default();

        if let Some(deadline) = todo.deadline {
            deadline_count += 1;
            let left = days_left(deadline, base_day);
            if left < 0 && !todo.completed {
                overdue_count += 1;
            }
            if !todo.completed {
                weighted_deadline_score += deadline_weight(left);
            }
        } else if todo.date.is_some() {
            scheduled_count += 1;
        }
    }

    BusynessBreakdown {
        scheduled_count,
        deadline_count,
        overdue_count,
        weighted_deadline_score,
        total_difficulty_score,
        calculated_at: Utc::now(),
    }
}

/// Sum the bonus earned by a set of completed items on `target_day`.
///
/// Each item grants its difficulty; deadline items add the proximity weight
/// plus a flat overdue premium, date-only items a flat scheduled bonus.
pub fn daily_bonus<'a, I>(todos: I, target_day: NaiveDate) -> i64
where
    I: IntoIterator<Item = &'a Todo>,
{
    let mut bonus = 0;

    for todo in todos {
        bonus += todo.difficulty_or_default();

        if let Some(deadline) = todo.deadline {
            let left = days_left(deadline, target_day);
            bonus += deadline_weight(left);
            if left < 0 {
                bonus += OVERDUE_WEIGHT;
            }
        } else if todo.date.is_some() {
            bonus += DATE_ONLY_BONUS;
        }
    }

    bonus
}
