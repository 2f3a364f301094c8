//! Schedule service: window lists and scoped edits/deletes over recurring
//! series.
//!
//! Schedules carry no completion state and do not feed the busyness score,
//! so mutations here enqueue no recalculation.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use cadence_core::{
    expand_schedule, DayWindow, Result, Schedule, ScheduleDraft, ScheduleInstance,
    ScheduleRepository, ScopeAction,
};

use crate::split::{
    needs_truncation, truncation_end, ScheduleDeleteOutcome, ScheduleSplitOutcome, ScopedDelete,
    ScopedScheduleUpdate,
};

/// Synchronous request-path operations over schedules.
pub struct ScheduleService {
    schedules: Arc<dyn ScheduleRepository>,
}

impl ScheduleService {
    /// Create a service over the given repository.
    pub fn new(schedules: Arc<dyn ScheduleRepository>) -> Self {
        Self { schedules }
    }

    /// Schedules intersecting the window: one-offs by interval overlap plus
    /// every expanded instance of matching recurring series.
    #[instrument(skip(self))]
    pub async fn list_window(
        &self,
        owner: Uuid,
        window: DayWindow,
        project: Option<Uuid>,
    ) -> Result<Vec<ScheduleInstance>> {
        let mut instances: Vec<ScheduleInstance> = self
            .schedules
            .list_one_off_overlapping(owner, project, window)
            .await?
            .into_iter()
            .map(|schedule| ScheduleInstance {
                start_at: schedule.start_at,
                end_at: schedule.end_at,
                schedule,
            })
            .collect();

        let recurring = self
            .schedules
            .list_recurring_reaching(owner, project, window)
            .await?;
        for schedule in &recurring {
            instances.extend(expand_schedule(schedule, window));
        }

        debug!(
            subsystem = "engine",
            op = "list_window",
            user_id = %owner,
            result_count = instances.len(),
            "Expanded schedule window"
        );
        Ok(instances)
    }

    /// Create a schedule for `owner`.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, owner: Uuid, draft: ScheduleDraft) -> Result<Schedule> {
        draft.validate()?;
        let schedule = Schedule::from_draft(owner, draft);
        self.schedules.insert(&schedule).await?;
        Ok(schedule)
    }

    /// Apply a scoped edit to a schedule, splitting its series as the action
    /// requires.
    #[instrument(skip(self, request))]
    pub async fn update_scoped(
        &self,
        owner: Uuid,
        id: Uuid,
        request: ScopedScheduleUpdate,
    ) -> Result<ScheduleSplitOutcome> {
        request.draft.validate()?;
        let mut schedule = self.schedules.fetch_owned(id, owner).await?;

        if !schedule.repeat.is_recurring() || request.action == ScopeAction::All {
            schedule.apply_draft(request.draft);
            self.schedules.update(&schedule).await?;
            return Ok(ScheduleSplitOutcome::Updated(schedule));
        }

        let target = request.target_date;

        match request.action {
            ScopeAction::All => unreachable!("handled above"),
            ScopeAction::OnlyThisDate => {
                self.truncate(&schedule, target).await?;

                // Detached occurrence with the edit applied, no longer recurring.
                let mut one_off_draft = request.draft;
                one_off_draft.repeat = cadence_core::Recurrence::None;
                let edited = Schedule::from_draft(owner, one_off_draft);
                self.schedules.insert(&edited).await?;

                let continuation = self.fork_continuation(&schedule, target).await?;
                Ok(ScheduleSplitOutcome::SplitOne {
                    edited,
                    continuation,
                })
            }
            ScopeAction::FromThisDate => {
                self.truncate(&schedule, target).await?;
                let replacement = Schedule::from_draft(owner, request.draft);
                self.schedules.insert(&replacement).await?;
                Ok(ScheduleSplitOutcome::SplitFrom { replacement })
            }
        }
    }

    /// Apply a scoped delete to a schedule.
    #[instrument(skip(self, request))]
    pub async fn delete_scoped(
        &self,
        owner: Uuid,
        id: Uuid,
        request: ScopedDelete,
    ) -> Result<ScheduleDeleteOutcome> {
        let schedule = self.schedules.fetch_owned(id, owner).await?;

        if !schedule.repeat.is_recurring() || request.action == ScopeAction::All {
            self.schedules.delete(id).await?;
            return Ok(ScheduleDeleteOutcome::Deleted);
        }

        let target = request.target_date;
        match request.action {
            ScopeAction::All => unreachable!("handled above"),
            ScopeAction::OnlyThisDate => {
                self.truncate(&schedule, target).await?;
                let continuation = self.fork_continuation(&schedule, target).await?;
                Ok(ScheduleDeleteOutcome::DetachedOne { continuation })
            }
            ScopeAction::FromThisDate => {
                self.truncate(&schedule, target).await?;
                Ok(ScheduleDeleteOutcome::TruncatedFrom)
            }
        }
    }

    /// Pull the series end back to the day before `target` when the current
    /// bound does not already exclude it.
    async fn truncate(&self, schedule: &Schedule, target: NaiveDate) -> Result<()> {
        if needs_truncation(schedule.repeat.end_date(), target) {
            self.schedules
                .set_repeat_end(schedule.id, Some(truncation_end(target)))
                .await?;
        }
        Ok(())
    }

    /// Insert a clone of the pre-truncation series anchored at the next
    /// occurrence after `target`, keeping the anchor's time-of-day and
    /// duration and the original end bound.
    async fn fork_continuation(
        &self,
        schedule: &Schedule,
        target: NaiveDate,
    ) -> Result<Schedule> {
        let next_day = schedule.repeat.next_occurrence_after(target);
        let (start_at, end_at) = schedule.occurrence_interval(next_day);
        let now = Utc::now();

        // `schedule` predates the truncation, so the clone keeps the
        // original end bound.
        let mut continuation = schedule.clone();
        continuation.id = Uuid::new_v4();
        continuation.start_at = start_at;
        continuation.end_at = end_at;
        continuation.created_at = now;
        continuation.updated_at = now;
        self.schedules.insert(&continuation).await?;
        Ok(continuation)
    }
}
