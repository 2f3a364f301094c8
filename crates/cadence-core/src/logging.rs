//! Structured logging field name constants for cadence.
//!
//! All crates use these constants for consistent structured logging fields so
//! log aggregation tools can query by standardized names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (expanded instances, queue traffic) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "engine", "db", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "split", "worker", "sweep", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "list_for_day", "compute_busyness", "enqueue"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Owner/user UUID being operated on.
pub const USER_ID: &str = "user_id";

/// Todo UUID being operated on.
pub const TODO_ID: &str = "todo_id";

/// Schedule UUID being operated on.
pub const SCHEDULE_ID: &str = "schedule_id";

/// Recalculation task kind ("busyness" | "bonus").
pub const TASK_KIND: &str = "task_kind";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query or expansion.
pub const RESULT_COUNT: &str = "result_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
