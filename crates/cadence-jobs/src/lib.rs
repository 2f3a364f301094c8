//! # cadence-jobs
//!
//! Background score recalculation for cadence.
//!
//! This crate provides:
//! - The busyness and bonus calculators (gather, expand, score, upsert)
//! - A worker draining the bounded recalculation queue, with broadcast
//!   events and graceful shutdown
//! - The daily cron-style sweep recomputing busyness for every known user
//!
//! ## Example
//!
//! ```ignore
//! use cadence_core::RecalcQueue;
//! use cadence_db::Database;
//! use cadence_jobs::{ScoreWorker, WorkerConfig};
//!
//! let db = Database::connect("postgres://...").await?;
//! let (queue, receiver) = RecalcQueue::new();
//!
//! let worker = ScoreWorker::from_database(&db, WorkerConfig::from_env());
//! let handle = worker.start(receiver);
//!
//! // Request-path services enqueue; the worker recalculates.
//! queue.enqueue_busyness(user_id, today);
//!
//! // Graceful shutdown.
//! handle.shutdown().await?;
//! ```

pub mod bonus;
pub mod busyness;
pub mod scheduler;
pub mod worker;

use std::sync::Arc;

use cadence_db::{
    Database, PgBonusScoreRepository, PgBusynessScoreRepository, PgCompletionRepository,
    PgTodoRepository,
};

pub use bonus::BonusCalculator;
pub use busyness::BusynessCalculator;
pub use scheduler::{DailySweep, SweepConfig, SweepEvent, SweepHandle, SweepSummary};
pub use worker::{ScoreWorker, WorkerConfig, WorkerEvent, WorkerHandle};

// Re-export core types
pub use cadence_core::{RecalcKind, RecalcQueue, RecalcReceiver, RecalcTask};

/// Build both calculators over a PostgreSQL [`Database`].
pub fn calculators_from_database(db: &Database) -> (BusynessCalculator, BonusCalculator) {
    let todos = Arc::new(PgTodoRepository::new(db.pool.clone()));
    let completions = Arc::new(PgCompletionRepository::new(db.pool.clone()));
    let busyness_scores = Arc::new(PgBusynessScoreRepository::new(db.pool.clone()));
    let bonus_scores = Arc::new(PgBonusScoreRepository::new(db.pool.clone()));

    (
        BusynessCalculator::new(todos.clone(), busyness_scores),
        BonusCalculator::new(todos, completions, bonus_scores),
    )
}
