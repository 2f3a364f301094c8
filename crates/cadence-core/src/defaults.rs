//! Centralized default constants for the cadence system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// SCORING
// =============================================================================

/// Difficulty assumed for items that carry none (scale is 1..=5).
pub const DEFAULT_DIFFICULTY: i64 = 3;

/// Minimum allowed difficulty.
pub const DIFFICULTY_MIN: i32 = 1;

/// Maximum allowed difficulty.
pub const DIFFICULTY_MAX: i32 = 5;

/// Busyness look-ahead window length in days (3 weeks, inclusive of the base day).
pub const BUSYNESS_LOOKAHEAD_DAYS: i64 = 20;

/// Base deadline-proximity score; decays per day of slack remaining.
pub const DEADLINE_BASE_SCORE: i64 = 30;

/// Deadline score decay per remaining day.
pub const DEADLINE_DECAY_PER_DAY: i64 = 5;

/// Flat weight added per overdue incomplete item.
pub const OVERDUE_WEIGHT: i64 = 40;

/// Flat weight added per date-only (scheduled) item.
pub const SCHEDULED_WEIGHT: i64 = 5;

/// Bonus granted for completing a date-only item.
pub const DATE_ONLY_BONUS: i64 = 5;

// =============================================================================
// BACKGROUND PROCESSING
// =============================================================================

/// Default bounded capacity of the score recalculation queue.
pub const RECALC_QUEUE_CAPACITY: usize = 256;

/// Default worker event broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Default UTC hour at which the daily busyness sweep runs.
pub const SWEEP_HOUR_UTC: u32 = 9;

/// Polling interval for the sweep scheduler's clock check (seconds).
pub const SWEEP_TICK_SECS: u64 = 60;
