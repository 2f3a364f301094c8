//! Repository traits for cadence abstractions.
//!
//! These traits define the persistence interfaces that concrete backends
//! must satisfy, enabling pluggable storage and testability. Every operation
//! is scoped by owner id; the owner boundary is the only isolation the store
//! provides.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::temporal::DayWindow;

// =============================================================================
// TODO REPOSITORY
// =============================================================================

/// Repository for todo records.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Insert a new todo.
    async fn insert(&self, todo: &Todo) -> Result<()>;

    /// Insert several todos at once (project fan-out).
    async fn insert_bulk(&self, todos: &[Todo]) -> Result<()>;

    /// Fetch a todo owned by `owner`. `NotFound` when absent or foreign.
    async fn fetch_owned(&self, id: Uuid, owner: Uuid) -> Result<Todo>;

    /// Fetch todos by id, skipping ids that no longer resolve.
    async fn fetch_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Todo>>;

    /// Persist the current state of an existing todo.
    async fn update(&self, todo: &Todo) -> Result<()>;

    /// Rewrite only the recurrence end bound (series truncation).
    async fn set_repeat_end(&self, id: Uuid, end_date: Option<NaiveDate>) -> Result<()>;

    /// Rewrite only the completion flag (non-recurring todos).
    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<()>;

    /// Delete a todo outright.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Non-recurring todos due in the day list for `day`: dated todos on
    /// that day (without a deadline), plus deadline-only todos whose
    /// deadline has not passed.
    async fn list_one_off_due(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        day: NaiveDate,
    ) -> Result<Vec<Todo>>;

    /// Incomplete non-recurring todos whose date or deadline falls inside
    /// the window (busyness gather).
    async fn list_one_off_open_in_window(
        &self,
        owner: Uuid,
        window: DayWindow,
    ) -> Result<Vec<Todo>>;

    /// Completed non-recurring todos matching `day` by date, or by a
    /// still-open deadline (bonus gather).
    async fn list_one_off_completed_on(&self, owner: Uuid, day: NaiveDate) -> Result<Vec<Todo>>;

    /// Recurring todos whose series can reach the window: anchored on or
    /// before the window end, with no end bound or one on/after the window
    /// start.
    async fn list_recurring_reaching(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        window: DayWindow,
    ) -> Result<Vec<Todo>>;
}

// =============================================================================
// SCHEDULE REPOSITORY
// =============================================================================

/// Repository for schedule records.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Insert a new schedule.
    async fn insert(&self, schedule: &Schedule) -> Result<()>;

    /// Fetch a schedule owned by `owner`. `NotFound` when absent or foreign.
    async fn fetch_owned(&self, id: Uuid, owner: Uuid) -> Result<Schedule>;

    /// Persist the current state of an existing schedule.
    async fn update(&self, schedule: &Schedule) -> Result<()>;

    /// Rewrite only the recurrence end bound (series truncation).
    async fn set_repeat_end(&self, id: Uuid, end_date: Option<NaiveDate>) -> Result<()>;

    /// Delete a schedule outright.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Non-recurring schedules whose interval intersects the window.
    async fn list_one_off_overlapping(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        window: DayWindow,
    ) -> Result<Vec<Schedule>>;

    /// Recurring schedules whose series can reach the window.
    async fn list_recurring_reaching(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        window: DayWindow,
    ) -> Result<Vec<Schedule>>;
}

// =============================================================================
// COMPLETION REPOSITORY
// =============================================================================

/// Repository for per-instance completion marks of recurring todos.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Record completion of one instance. Idempotent: marking an already
    /// marked instance is a no-op.
    async fn mark(&self, todo: Uuid, owner: Uuid, date: NaiveDate) -> Result<()>;

    /// Clear a completion mark. Clearing an absent mark is a no-op.
    async fn unmark(&self, todo: Uuid, owner: Uuid, date: NaiveDate) -> Result<()>;

    /// Whether the instance on `date` is marked complete.
    async fn exists(&self, todo: Uuid, owner: Uuid, date: NaiveDate) -> Result<bool>;

    /// All marks an owner recorded for `date` (bonus gather).
    async fn list_for_day(&self, owner: Uuid, date: NaiveDate) -> Result<Vec<CompletionMark>>;
}

// =============================================================================
// SCORE REPOSITORIES
// =============================================================================

/// Repository for stored busyness scores.
#[async_trait]
pub trait BusynessScoreRepository: Send + Sync {
    /// Replace the record for `(record.user, record.date)`.
    async fn upsert(&self, record: &BusynessScoreRecord) -> Result<()>;

    /// Fetch the record for a user's day, if one was computed.
    async fn fetch(&self, user: Uuid, date: NaiveDate) -> Result<Option<BusynessScoreRecord>>;
}

/// Repository for weekly bonus records.
#[async_trait]
pub trait BonusScoreRepository: Send + Sync {
    /// Fetch a user's record for the week starting `week_start`.
    async fn fetch(&self, user: Uuid, week_start: NaiveDate) -> Result<Option<BonusScoreRecord>>;

    /// Replace the record for `(record.user, record.week_start)`.
    async fn upsert(&self, record: &BonusScoreRecord) -> Result<()>;

    /// All users' records for a week, ordered by total bonus descending
    /// (weekly ranking).
    async fn list_for_week(&self, week_start: NaiveDate) -> Result<Vec<BonusScoreRecord>>;
}

// =============================================================================
// USER DIRECTORY
// =============================================================================

/// Read-only view of known user ids, consumed by the daily sweep.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every known user id.
    async fn list_user_ids(&self) -> Result<Vec<Uuid>>;
}
