//! Busyness calculator: forward-looking workload pressure per user per day.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument};
use uuid::Uuid;

use cadence_core::{
    breakdown_from_todos, defaults::BUSYNESS_LOOKAHEAD_DAYS, expand_todo, BusynessScoreRecord,
    BusynessScoreRepository, DayWindow, Result, Todo, TodoRepository,
};

/// Computes and stores the busyness score for a user's day.
///
/// Gathers the open one-off todos whose date or deadline falls in the
/// three-week look-ahead window, expands every recurring series reaching the
/// window, folds the combined set into a breakdown, and replaces the stored
/// record for `(user, base_day)`.
pub struct BusynessCalculator {
    todos: Arc<dyn TodoRepository>,
    scores: Arc<dyn BusynessScoreRepository>,
}

impl BusynessCalculator {
    /// Create a calculator over the given repositories.
    pub fn new(todos: Arc<dyn TodoRepository>, scores: Arc<dyn BusynessScoreRepository>) -> Self {
        Self { todos, scores }
    }

    /// Run one computation and upsert the result.
    ///
    /// Recurring instances are counted whether or not a completion mark
    /// exists for them; only the one-off gather excludes completed todos.
    #[instrument(skip(self))]
    pub async fn compute_and_store(
        &self,
        user: Uuid,
        base_day: NaiveDate,
    ) -> Result<BusynessScoreRecord> {
        let window = DayWindow::look_ahead(base_day, BUSYNESS_LOOKAHEAD_DAYS);

        let mut gathered: Vec<Todo> = self
            .todos
            .list_one_off_open_in_window(user, window)
            .await?;

        let recurring = self
            .todos
            .list_recurring_reaching(user, None, window)
            .await?;
        for todo in &recurring {
            gathered.extend(expand_todo(todo, window));
        }

        let breakdown = breakdown_from_todos(&gathered, base_day);
        let record = BusynessScoreRecord {
            user,
            date: base_day,
            score: breakdown.score(),
            breakdown,
        };
        self.scores.upsert(&record).await?;

        debug!(
            subsystem = "jobs",
            component = "busyness",
            user_id = %user,
            result_count = gathered.len(),
            score = record.score,
            "Stored busyness score"
        );
        Ok(record)
    }
}
