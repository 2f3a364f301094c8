//! Core data models for cadence.
//!
//! These types are shared across all cadence crates and represent the
//! domain entities: recurring items (todos, schedules), completion marks,
//! and the two derived score records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::error::{Error, Result};
use crate::recurrence::Recurrence;
use crate::temporal;

// =============================================================================
// TODO TYPES
// =============================================================================

/// A todo: date- or deadline-anchored work item, possibly recurring.
///
/// `completed` is meaningful only for non-recurring todos; recurring
/// instances track completion through [`CompletionMark`] records instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub owner: Uuid,
    pub project: Option<Uuid>,
    pub category: Uuid,
    pub title: String,
    /// Anchor day for recurring todos; occurrence day for plain dated todos.
    pub date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    /// 1..=5; scoring assumes 3 when unset.
    pub difficulty: Option<i32>,
    pub completed: bool,
    pub repeat: Recurrence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Build a fresh record from validated draft data.
    pub fn from_draft(owner: Uuid, draft: TodoDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            project: draft.project,
            category: draft.category,
            title: draft.title,
            date: draft.date,
            deadline: draft.deadline,
            difficulty: draft.difficulty,
            completed: false,
            repeat: draft.repeat,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite payload fields from a draft, keeping identity and ownership.
    pub fn apply_draft(&mut self, draft: TodoDraft) {
        self.project = draft.project;
        self.category = draft.category;
        self.title = draft.title;
        self.date = draft.date;
        self.deadline = draft.deadline;
        self.difficulty = draft.difficulty;
        self.repeat = draft.repeat;
        self.updated_at = Utc::now();
    }

    /// Materialize this todo's payload on a concrete occurrence day.
    pub fn occurrence_on(&self, day: NaiveDate) -> Todo {
        let mut instance = self.clone();
        instance.date = Some(day);
        instance
    }

    /// Effective difficulty for scoring.
    pub fn difficulty_or_default(&self) -> i64 {
        self.difficulty
            .map(i64::from)
            .unwrap_or(defaults::DEFAULT_DIFFICULTY)
    }
}

/// Incoming todo data for creates and scoped-edit replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoDraft {
    pub title: String,
    pub project: Option<Uuid>,
    pub category: Uuid,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub difficulty: Option<i32>,
    #[serde(default)]
    pub repeat: Recurrence,
}

impl TodoDraft {
    /// Validate required fields and the recurrence rule against its anchor.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }
        if let Some(diff) = self.difficulty {
            if !(defaults::DIFFICULTY_MIN..=defaults::DIFFICULTY_MAX).contains(&diff) {
                return Err(Error::Validation(format!(
                    "difficulty {diff} is outside {}..={}",
                    defaults::DIFFICULTY_MIN,
                    defaults::DIFFICULTY_MAX
                )));
            }
        }
        if self.repeat.is_recurring() {
            let anchor = self.date.ok_or_else(|| {
                Error::Validation("recurring todo requires an anchor date".to_string())
            })?;
            self.repeat.validate(anchor)?;
        }
        Ok(())
    }
}

/// One concrete occurrence of a todo inside a query window.
///
/// `date` is `None` for deadline-only one-offs, which surface in day lists
/// without a scheduled day of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoInstance {
    pub todo: Todo,
    pub date: Option<NaiveDate>,
    pub completed: bool,
}

// =============================================================================
// SCHEDULE TYPES
// =============================================================================

/// A schedule: a time-interval calendar entry, possibly recurring.
///
/// The anchor day is `start_at.date_naive()`; recurring instances keep the
/// anchor's time-of-day and duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub owner: Uuid,
    pub project: Option<Uuid>,
    pub category: Uuid,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub repeat: Recurrence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    /// Build a fresh record from validated draft data.
    pub fn from_draft(owner: Uuid, draft: ScheduleDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            project: draft.project,
            category: draft.category,
            title: draft.title,
            start_at: draft.start_at,
            end_at: draft.end_at,
            repeat: draft.repeat,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite payload fields from a draft, keeping identity and ownership.
    pub fn apply_draft(&mut self, draft: ScheduleDraft) {
        self.project = draft.project;
        self.category = draft.category;
        self.title = draft.title;
        self.start_at = draft.start_at;
        self.end_at = draft.end_at;
        self.repeat = draft.repeat;
        self.updated_at = Utc::now();
    }

    /// The calendar day this series is anchored on.
    pub fn anchor_day(&self) -> NaiveDate {
        self.start_at.date_naive()
    }

    /// Start/end instants of the occurrence on `day`: the anchor's
    /// time-of-day carried onto `day`, duration preserved.
    pub fn occurrence_interval(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = temporal::day_start(day) + (self.start_at - temporal::day_start(self.anchor_day()));
        let end = start + (self.end_at - self.start_at);
        (start, end)
    }
}

/// Incoming schedule data for creates and scoped-edit replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub title: String,
    pub project: Option<Uuid>,
    pub category: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub repeat: Recurrence,
}

impl ScheduleDraft {
    /// Validate required fields and the recurrence rule against its anchor.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }
        if self.start_at > self.end_at {
            return Err(Error::Validation(format!(
                "schedule start {} is after end {}",
                self.start_at, self.end_at
            )));
        }
        self.repeat.validate(self.start_at.date_naive())
    }
}

/// One concrete occurrence of a schedule inside a query window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInstance {
    pub schedule: Schedule,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

// =============================================================================
// COMPLETION TYPES
// =============================================================================

/// Completion of one recurring-todo instance, unique per (todo, owner, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMark {
    pub todo: Uuid,
    pub owner: Uuid,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SCOPE ACTIONS
// =============================================================================

/// How far an edit or delete propagates across a recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeAction {
    /// Mutate the matched record in place.
    All,
    /// Detach a single occurrence, preserving the rest of the series.
    OnlyThisDate,
    /// Cut the series at the target date.
    FromThisDate,
}

impl std::str::FromStr for ScopeAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(ScopeAction::All),
            "only_this_date" => Ok(ScopeAction::OnlyThisDate),
            "from_this_date" => Ok(ScopeAction::FromThisDate),
            other => Err(Error::Validation(format!("unknown scope action: {other}"))),
        }
    }
}

// =============================================================================
// SCORE TYPES
// =============================================================================

/// Per-day workload breakdown backing a busyness score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusynessBreakdown {
    /// Items carrying only a date.
    pub scheduled_count: i64,
    /// Items carrying a deadline.
    pub deadline_count: i64,
    /// Incomplete items whose deadline already passed.
    pub overdue_count: i64,
    /// Sum of deadline-proximity weights over incomplete items.
    pub weighted_deadline_score: i64,
    /// Sum of difficulties (default 3).
    pub total_difficulty_score: i64,
    pub calculated_at: DateTime<Utc>,
}

impl BusynessBreakdown {
    /// Combined score: difficulty + deadline pressure + overdue and
    /// scheduled weights.
    pub fn score(&self) -> i64 {
        self.total_difficulty_score
            + self.weighted_deadline_score
            + self.overdue_count * defaults::OVERDUE_WEIGHT
            + self.scheduled_count * defaults::SCHEDULED_WEIGHT
    }
}

/// Stored busyness score, unique per (user, date); replaced on recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusynessScoreRecord {
    pub user: Uuid,
    pub date: NaiveDate,
    pub score: i64,
    pub breakdown: BusynessBreakdown,
}

/// One day's entry in a weekly bonus breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBonus {
    pub date: NaiveDate,
    pub bonus: i64,
}

/// Weekly bonus aggregate, unique per (user, week_start).
///
/// `week_start` is the Monday of the week; `breakdown` stays ordered by date
/// with at most one entry per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusScoreRecord {
    pub user: Uuid,
    pub week_start: NaiveDate,
    pub total_bonus: i64,
    pub breakdown: Vec<DailyBonus>,
    pub updated_at: DateTime<Utc>,
}

impl BonusScoreRecord {
    /// Empty record for a user's week.
    pub fn new(user: Uuid, week_start: NaiveDate) -> Self {
        Self {
            user,
            week_start,
            total_bonus: 0,
            breakdown: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Set `date`'s bonus, replacing any prior entry in place: the old value
    /// is subtracted from the total before the new one is added, so repeated
    /// recalculation of the same day never double-counts.
    pub fn apply_day(&mut self, date: NaiveDate, bonus: i64) {
        match self.breakdown.iter_mut().find(|e| e.date == date) {
            Some(existing) => {
                self.total_bonus -= existing.bonus;
                existing.bonus = bonus;
            }
            None => {
                let at = self
                    .breakdown
                    .partition_point(|e| e.date < date);
                self.breakdown.insert(at, DailyBonus { date, bonus });
            }
        }
        self.total_bonus += bonus;
        self.updated_at = Utc::now();
    }
}

/// Result of one bonus recalculation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusOutcome {
    pub total_bonus: i64,
    pub daily_bonus: i64,
    pub todos_count: usize,
}
