//! Todo service: day lists, creation with project fan-out, and scoped
//! edits/deletes over recurring series.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use cadence_core::{
    expand_todo, CompletionRepository, DayWindow, RecalcQueue, Result, ScopeAction, Todo,
    TodoDraft, TodoInstance, TodoRepository,
};

use crate::split::{
    needs_truncation, truncation_end, ScopedDelete, ScopedTodoUpdate, TodoDeleteOutcome,
    TodoSplitOutcome,
};

/// Synchronous request-path operations over todos.
///
/// Every mutation enqueues a busyness recalculation for the affected owners
/// and returns without waiting on it.
pub struct TodoService {
    todos: Arc<dyn TodoRepository>,
    completions: Arc<dyn CompletionRepository>,
    recalc: RecalcQueue,
}

impl TodoService {
    /// Create a service over the given repositories.
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

    /// Todos due on `day`: one-offs (dated that day, or deadline still open)
    /// plus one instance per matching recurring series, each carrying its own
    /// completion flag from the mark store.
    #[instrument(skip(self))]
    pub async fn list_for_day(
        &self,
        owner: Uuid,
        day: NaiveDate,
        project: Option<Uuid>,
    ) -> Result<Vec<TodoInstance>> {
        let mut instances: Vec<TodoInstance> = self
            .todos
            .list_one_off_due(owner, project, day)
            .await?
            .into_iter()
            .map(|todo| TodoInstance {
                date: todo.date,
                completed: todo.completed,
                todo,
            })
            .collect();

        let window = DayWindow::single(day);
        let recurring = self
            .todos
            .list_recurring_reaching(owner, project, window)
            .await?;

        for todo in recurring {
            for occurrence in expand_todo(&todo, window) {
                let completed = self.completions.exists(todo.id, owner, day).await?;
                instances.push(TodoInstance {
                    todo: todo.clone(),
                    date: occurrence.date,
                    completed,
                });
            }
        }

        debug!(
            subsystem = "engine",
            op = "list_for_day",
            user_id = %owner,
            result_count = instances.len(),
            "Expanded day list"
        );
        Ok(instances)
    }

    /// Create a todo for `owner`, fanning copies out to `share_with` (the
    /// other members of the todo's project, resolved by the caller). One
    /// busyness recalculation is enqueued per affected user.
    #[instrument(skip(self, draft, share_with))]
    pub async fn create(
        &self,
        owner: Uuid,
        draft: TodoDraft,
        share_with: &[Uuid],
    ) -> Result<Todo> {
        draft.validate()?;

        let todo = Todo::from_draft(owner, draft.clone());
        self.todos.insert(&todo).await?;
        self.recalc.enqueue_busyness(owner, Utc::now().date_naive());

        let copies: Vec<Todo> = share_with
            .iter()
            .filter(|member| **member != owner)
            .map(|member| Todo::from_draft(*member, draft.clone()))
            .collect();
        if !copies.is_empty() {
            self.todos.insert_bulk(&copies).await?;
            for copy in &copies {
                self.recalc
                    .enqueue_busyness(copy.owner, Utc::now().date_naive());
            }
        }

        Ok(todo)
    }

    /// Apply a scoped edit to a todo, splitting its series as the action
    /// requires.
    #[instrument(skip(self, request))]
    pub async fn update_scoped(
        &self,
        owner: Uuid,
        id: Uuid,
        request: ScopedTodoUpdate,
    ) -> Result<TodoSplitOutcome> {
        request.draft.validate()?;
        let mut todo = self.todos.fetch_owned(id, owner).await?;

        if !todo.repeat.is_recurring() || request.action == ScopeAction::All {
            todo.apply_draft(request.draft);
            self.todos.update(&todo).await?;
            self.recalc.enqueue_busyness(owner, Utc::now().date_naive());
            return Ok(TodoSplitOutcome::Updated(todo));
        }

        let target = request.target_date;

        match request.action {
            ScopeAction::All => unreachable!("handled above"),
            ScopeAction::OnlyThisDate => {
                self.truncate(&todo, target).await?;

                // Detached occurrence with the edit applied, no longer recurring.
                let mut one_off_draft = request.draft;
                one_off_draft.repeat = cadence_core::Recurrence::None;
                one_off_draft.date = Some(target);
                let edited = Todo::from_draft(owner, one_off_draft);
                self.todos.insert(&edited).await?;

                // Remainder of the series, anchored past the target with the
                // pre-truncation end bound restored.
                let continuation = self.fork_continuation(&todo, target).await?;

                self.recalc.enqueue_busyness(owner, Utc::now().date_naive());
                Ok(TodoSplitOutcome::SplitOne {
                    edited,
                    continuation,
                })
            }
            ScopeAction::FromThisDate => {
                self.truncate(&todo, target).await?;

                let replacement = Todo::from_draft(owner, request.draft);
                self.todos.insert(&replacement).await?;

                self.recalc.enqueue_busyness(owner, Utc::now().date_naive());
                Ok(TodoSplitOutcome::SplitFrom { replacement })
            }
        }
    }

    /// Apply a scoped delete to a todo.
    #[instrument(skip(self, request))]
    pub async fn delete_scoped(
        &self,
        owner: Uuid,
        id: Uuid,
        request: ScopedDelete,
    ) -> Result<TodoDeleteOutcome> {
        let todo = self.todos.fetch_owned(id, owner).await?;

        if !todo.repeat.is_recurring() || request.action == ScopeAction::All {
            self.todos.delete(id).await?;
            self.recalc.enqueue_busyness(owner, Utc::now().date_naive());
            return Ok(TodoDeleteOutcome::Deleted);
        }

        let target = request.target_date;
        match request.action {
            ScopeAction::All => unreachable!("handled above"),
            ScopeAction::OnlyThisDate => {
                self.truncate(&todo, target).await?;
                let continuation = self.fork_continuation(&todo, target).await?;
                self.recalc.enqueue_busyness(owner, Utc::now().date_naive());
                Ok(TodoDeleteOutcome::DetachedOne { continuation })
            }
            ScopeAction::FromThisDate => {
                self.truncate(&todo, target).await?;
                self.recalc.enqueue_busyness(owner, Utc::now().date_naive());
                Ok(TodoDeleteOutcome::TruncatedFrom)
            }
        }
    }

    /// Pull the series end back to the day before `target` when the current
    /// bound does not already exclude it.
    async fn truncate(&self, todo: &Todo, target: NaiveDate) -> Result<()> {
        if needs_truncation(todo.repeat.end_date(), target) {
            self.todos
                .set_repeat_end(todo.id, Some(truncation_end(target)))
                .await?;
        }
        Ok(())
    }

    /// Insert a clone of the pre-truncation series anchored at the next
    /// occurrence after `target`, preserving the original end bound.
    async fn fork_continuation(&self, todo: &Todo, target: NaiveDate) -> Result<Todo> {
        // `todo` predates the truncation, so the clone keeps the original
        // end bound.
        let now = Utc::now();
        let mut continuation = todo.clone();
        continuation.id = Uuid::new_v4();
        continuation.date = Some(todo.repeat.next_occurrence_after(target));
        continuation.created_at = now;
        continuation.updated_at = now;
        self.todos.insert(&continuation).await?;
        Ok(continuation)
    }
}
