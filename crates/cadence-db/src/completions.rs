//! Completion-mark repository implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cadence_core::{CompletionMark, CompletionRepository, Error, Result};

/// PostgreSQL implementation of CompletionRepository.
///
/// The table's primary key is the (todo, owner, date) triple, so marking is
/// a conflict-ignoring insert and uniqueness needs no application logic.
pub struct PgCompletionRepository {
    pool: Pool<Postgres>,
}

impl PgCompletionRepository {
    /// Create a new PgCompletionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_mark_row(row: sqlx::postgres::PgRow) -> CompletionMark {
        CompletionMark {
            todo: row.get("todo"),
            owner: row.get("owner"),
            date: row.get("date"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl CompletionRepository for PgCompletionRepository {
    async fn mark(&self, todo: Uuid, owner: Uuid, date: NaiveDate) -> Result<()> {
        sqlx::query(
            "INSERT INTO completed_repeat_todo (todo, owner, date, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (todo, owner, date) DO NOTHING",
        )
        .bind(todo)
        .bind(owner)
        .bind(date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn unmark(&self, todo: Uuid, owner: Uuid, date: NaiveDate) -> Result<()> {
        sqlx::query(
            "DELETE FROM completed_repeat_todo WHERE todo = $1 AND owner = $2 AND date = $3",
        )
        .bind(todo)
        .bind(owner)
        .bind(date)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn exists(&self, todo: Uuid, owner: Uuid, date: NaiveDate) -> Result<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM completed_repeat_todo
                 WHERE todo = $1 AND owner = $2 AND date = $3
             )",
        )
        .bind(todo)
        .bind(owner)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(found)
    }

    async fn list_for_day(&self, owner: Uuid, date: NaiveDate) -> Result<Vec<CompletionMark>> {
        let rows = sqlx::query(
            "SELECT todo, owner, date, created_at FROM completed_repeat_todo
             WHERE owner = $1 AND date = $2
             ORDER BY created_at",
        )
        .bind(owner)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(Self::parse_mark_row).collect())
    }
}
