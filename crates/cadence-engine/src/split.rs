//! Shared pieces of the series split state machine.
//!
//! A scoped edit or delete on a recurring series is a truncate-and-fork: the
//! matched record's end bound is pulled back to the day before the target,
//! and new records carry the detached occurrence and/or the remainder of the
//! series. The "series" itself stays informal: nothing links the forked
//! records beyond their anchors and owner.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use cadence_core::{Schedule, ScheduleDraft, ScopeAction, Todo, TodoDraft};

/// Scoped edit request for a todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopedTodoUpdate {
    pub action: ScopeAction,
    /// Occurrence day the edit is aimed at.
    pub target_date: NaiveDate,
    /// Replacement payload.
    pub draft: TodoDraft,
}

/// Scoped edit request for a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopedScheduleUpdate {
    pub action: ScopeAction,
    /// Day of the occurrence the edit is aimed at.
    pub target_date: NaiveDate,
    /// Replacement payload.
    pub draft: ScheduleDraft,
}

/// Scoped delete request (shared by todos and schedules).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScopedDelete {
    pub action: ScopeAction,
    /// Occurrence day the delete is aimed at.
    pub target_date: NaiveDate,
}

/// Result of a scoped todo edit.
#[derive(Debug, Clone)]
pub enum TodoSplitOutcome {
    /// The matched record was mutated in place (`all` scope, or the target
    /// was not recurring).
    Updated(Todo),
    /// One occurrence was detached and edited; the series continues from the
    /// next occurrence.
    SplitOne { edited: Todo, continuation: Todo },
    /// The series was cut at the target and replaced going forward.
    SplitFrom { replacement: Todo },
}

/// Result of a scoped todo delete.
#[derive(Debug, Clone)]
pub enum TodoDeleteOutcome {
    /// The record was removed outright.
    Deleted,
    /// One occurrence was removed; the series continues from the next
    /// occurrence.
    DetachedOne { continuation: Todo },
    /// The series was cut at the target; nothing replaces it.
    TruncatedFrom,
}

/// Result of a scoped schedule edit.
#[derive(Debug, Clone)]
pub enum ScheduleSplitOutcome {
    Updated(Schedule),
    SplitOne {
        edited: Schedule,
        continuation: Schedule,
    },
    SplitFrom {
        replacement: Schedule,
    },
}

/// Result of a scoped schedule delete.
#[derive(Debug, Clone)]
pub enum ScheduleDeleteOutcome {
    Deleted,
    DetachedOne { continuation: Schedule },
    TruncatedFrom,
}

/// End bound that excises `target` and everything after it from a series.
pub(crate) fn truncation_end(target: NaiveDate) -> NaiveDate {
    target - Days::new(1)
}

/// Whether truncation applies: only when the series is unbounded or its end
/// falls strictly after the target.
pub(crate) fn needs_truncation(original_end: Option<NaiveDate>, target: NaiveDate) -> bool {
    original_end.map_or(true, |end| end > target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_truncation_end_is_day_before_target() {
        assert_eq!(truncation_end(d("2024-03-15")), d("2024-03-14"));
    }

    #[test]
    fn test_needs_truncation() {
        assert!(needs_truncation(None, d("2024-03-15")));
        assert!(needs_truncation(Some(d("2024-04-01")), d("2024-03-15")));
        // end already on or before the target: leave it alone
        assert!(!needs_truncation(Some(d("2024-03-15")), d("2024-03-15")));
        assert!(!needs_truncation(Some(d("2024-03-01")), d("2024-03-15")));
    }
}
