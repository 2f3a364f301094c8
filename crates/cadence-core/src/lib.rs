//! # cadence-core
//!
//! Core types, traits, and abstractions for the cadence library.
//!
//! This crate provides the recurrence rules, instance expansion, pure
//! scoring math, and the repository trait definitions that other cadence
//! crates depend on.

pub mod defaults;
pub mod error;
pub mod expand;
pub mod logging;
pub mod models;
pub mod queue;
pub mod recurrence;
pub mod scoring;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use expand::{
    expand_schedule, expand_todo, occurrence_days, one_off_schedule_overlaps, one_off_todo_due_on,
    OccurrenceDays,
};
pub use models::*;
pub use queue::{RecalcKind, RecalcQueue, RecalcReceiver, RecalcTask};
pub use recurrence::Recurrence;
pub use scoring::{breakdown_from_todos, daily_bonus};
pub use temporal::{day_end, day_start, days_left, week_start, DayWindow};
pub use traits::*;
