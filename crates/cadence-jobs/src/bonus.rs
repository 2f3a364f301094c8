//! Bonus calculator: backward-looking credit for completed work, aggregated
//! into weekly records.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument};
use uuid::Uuid;

use cadence_core::{
    daily_bonus, week_start, BonusOutcome, BonusScoreRecord, BonusScoreRepository,
    CompletionRepository, Result, Todo, TodoRepository,
};

/// Computes a day's bonus for a user and merges it into the weekly record.
pub struct BonusCalculator {
    todos: Arc<dyn TodoRepository>,
    completions: Arc<dyn CompletionRepository>,
    scores: Arc<dyn BonusScoreRepository>,
}

impl BonusCalculator {
    /// Create a calculator over the given repositories.
    pub fn new(
        todos: Arc<dyn TodoRepository>,
        completions: Arc<dyn CompletionRepository>,
        scores: Arc<dyn BonusScoreRepository>,
    ) -> Self {
        Self {
            todos,
            completions,
            scores,
        }
    }

    /// Run one computation and merge the result into the record for
    /// `(user, monday-of-week)`.
    ///
    /// The gathered set is completed one-offs matching `target_day` plus the
    /// base todos behind that day's completion marks. The day's entry in the
    /// weekly breakdown is replaced in place, so reruns never double-count.
    #[instrument(skip(self))]
    pub async fn compute_and_store(
        &self,
        user: Uuid,
        target_day: NaiveDate,
    ) -> Result<BonusOutcome> {
        let mut completed: Vec<Todo> = self
            .todos
            .list_one_off_completed_on(user, target_day)
            .await?;

        let marks = self.completions.list_for_day(user, target_day).await?;
        let marked_ids: Vec<Uuid> = marks.iter().map(|m| m.todo).collect();
        completed.extend(self.todos.fetch_by_ids(&marked_ids).await?);

        let bonus = daily_bonus(&completed, target_day);

        let week = week_start(target_day);
        let mut record = self
            .scores
            .fetch(user, week)
            .await?
            .unwrap_or_else(|| BonusScoreRecord::new(user, week));
        record.apply_day(target_day, bonus);
        self.scores.upsert(&record).await?;

        debug!(
            subsystem = "jobs",
            component = "bonus",
            user_id = %user,
            result_count = completed.len(),
            daily_bonus = bonus,
            total_bonus = record.total_bonus,
            "Stored bonus score"
        );
        Ok(BonusOutcome {
            total_bonus: record.total_bonus,
            daily_bonus: bonus,
            todos_count: completed.len(),
        })
    }
}
