//! Completion tracker: per-instance completion for recurring todos, the
//! plain `completed` flag for everything else.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::instrument;
use uuid::Uuid;

use cadence_core::{CompletionRepository, Error, RecalcQueue, Result, TodoRepository};

/// Records and clears completion state, then triggers a bonus recalculation
/// as a fire-and-forget follow-up.
pub struct CompletionTracker {
    todos: Arc<dyn TodoRepository>,
    completions: Arc<dyn CompletionRepository>,
    recalc: RecalcQueue,
}

impl CompletionTracker {
    /// Create a tracker over the given repositories.
    pub fn new(
        todos: Arc<dyn TodoRepository>,
        completions: Arc<dyn CompletionRepository>,
        recalc: RecalcQueue,
    ) -> Self {
        Self {
            todos,
            completions,
            recalc,
        }
    }

    /// Set the completion state of a todo.
    ///
    /// Recurring todos require `date` and are tracked through completion
    /// marks: marking is idempotent, unmarking removes the mark entirely.
    /// Non-recurring todos flip their own `completed` column; `date` is
    /// ignored for them.
    #[instrument(skip(self))]
    pub async fn set_completion(
        &self,
        owner: Uuid,
        id: Uuid,
        date: Option<NaiveDate>,
        completed: bool,
    ) -> Result<()> {
        let todo = self.todos.fetch_owned(id, owner).await?;

        if todo.repeat.is_recurring() {
            let date = date.ok_or_else(|| {
                Error::Validation(
                    "date is required to complete a recurring todo instance".to_string(),
                )
            })?;
            if completed {
                self.completions.mark(id, owner, date).await?;
            } else {
                self.completions.unmark(id, owner, date).await?;
            }
        } else {
            self.todos.set_completed(id, completed).await?;
        }

        self.recalc.enqueue_bonus(owner, Utc::now().date_naive());
        Ok(())
    }
}
