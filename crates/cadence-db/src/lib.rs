//! # cadence-db
//!
//! PostgreSQL database layer for cadence.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for todos, schedules, completion marks,
//!   score records, and the user directory
//! - An in-memory store implementing the same traits for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use cadence_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/cadence").await?;
//!     let score = db.busyness_scores.fetch(user_id, today).await?;
//!     Ok(())
//! }
//! ```

pub mod completions;
pub mod memory;
pub mod pool;
pub mod schedules;
pub mod scores;
pub mod todos;
pub mod users;

// Re-export core types
pub use cadence_core::*;

// Re-export repository implementations
pub use completions::PgCompletionRepository;
pub use memory::MemoryStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use schedules::PgScheduleRepository;
pub use scores::{PgBonusScoreRepository, PgBusynessScoreRepository};
pub use todos::PgTodoRepository;
pub use users::PgUserDirectory;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Todo repository.
    pub todos: PgTodoRepository,
    /// Schedule repository.
    pub schedules: PgScheduleRepository,
    /// Completion-mark repository.
    pub completions: PgCompletionRepository,
    /// Busyness score repository.
    pub busyness_scores: PgBusynessScoreRepository,
    /// Bonus score repository.
    pub bonus_scores: PgBonusScoreRepository,
    /// User directory (daily sweep population).
    pub users: PgUserDirectory,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            todos: PgTodoRepository::new(pool.clone()),
            schedules: PgScheduleRepository::new(pool.clone()),
            completions: PgCompletionRepository::new(pool.clone()),
            busyness_scores: PgBusynessScoreRepository::new(pool.clone()),
            bonus_scores: PgBonusScoreRepository::new(pool.clone()),
            users: PgUserDirectory::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
