//! # cadence-engine
//!
//! Synchronous request-path services for cadence: day/window list queries
//! (recurrence expansion joined with completion state), creation with
//! project fan-out, the series split engine behind scoped edits/deletes, and
//! the completion tracker.
//!
//! Services run inside the triggering request and complete before a response
//! is produced; the only thing they defer is score recalculation, enqueued
//! onto the bounded [`RecalcQueue`](cadence_core::RecalcQueue) for the
//! background worker in cadence-jobs.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cadence_core::RecalcQueue;
//! use cadence_db::Database;
//! use cadence_engine::Engine;
//!
//! let db = Database::connect("postgres://localhost/cadence").await?;
//! let (recalc, receiver) = RecalcQueue::new();
//! let engine = Engine::from_database(&db, recalc);
//!
//! let todos = engine.todos.list_for_day(owner, today, None).await?;
//! ```

pub mod completion;
pub mod schedules;
pub mod split;
pub mod todos;

use std::sync::Arc;

use cadence_core::{CompletionRepository, RecalcQueue, ScheduleRepository, TodoRepository};
use cadence_db::{Database, PgCompletionRepository, PgScheduleRepository, PgTodoRepository};

pub use completion::CompletionTracker;
pub use schedules::ScheduleService;
pub use split::{
    ScheduleDeleteOutcome, ScheduleSplitOutcome, ScopedDelete, ScopedScheduleUpdate,
    ScopedTodoUpdate, TodoDeleteOutcome, TodoSplitOutcome,
};
pub use todos::TodoService;

/// Bundle of every request-path service, wired over one repository set and
/// one recalculation queue.
pub struct Engine {
    pub todos: TodoService,
    pub schedules: ScheduleService,
    pub completion: CompletionTracker,
}

impl Engine {
    /// Wire services over explicit repositories.
    pub fn new(
        todos: Arc<dyn TodoRepository>,
        schedules: Arc<dyn ScheduleRepository>,
        completions: Arc<dyn CompletionRepository>,
        recalc: RecalcQueue,
    ) -> Self {
        Self {
            todos: TodoService::new(todos.clone(), completions.clone(), recalc.clone()),
            schedules: ScheduleService::new(schedules),
            completion: CompletionTracker::new(todos, completions, recalc),
        }
    }

    /// Wire services over a PostgreSQL [`Database`].
    pub fn from_database(db: &Database, recalc: RecalcQueue) -> Self {
        Self::new(
            Arc::new(PgTodoRepository::new(db.pool.clone())),
            Arc::new(PgScheduleRepository::new(db.pool.clone())),
            Arc::new(PgCompletionRepository::new(db.pool.clone())),
            recalc,
        )
    }
}
