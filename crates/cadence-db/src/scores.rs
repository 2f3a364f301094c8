//! Score record repositories (busyness and bonus) with upsert-by-key.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cadence_core::{
    BonusScoreRecord, BonusScoreRepository, BusynessScoreRecord, BusynessScoreRepository, Error,
    Result,
};

/// PostgreSQL implementation of BusynessScoreRepository.
///
/// Records are whole-row replaced on conflict; the breakdown is never
/// partially patched.
pub struct PgBusynessScoreRepository {
    pool: Pool<Postgres>,
}

impl PgBusynessScoreRepository {
    /// Create a new PgBusynessScoreRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Result<BusynessScoreRecord> {
        let breakdown: JsonValue = row.get("breakdown");
        Ok(BusynessScoreRecord {
            user: row.get("user_id"),
            date: row.get("date"),
            score: row.get("score"),
            breakdown: serde_json::from_value(breakdown)?,
        })
    }
}

#[async_trait]
impl BusynessScoreRepository for PgBusynessScoreRepository {
    async fn upsert(&self, record: &BusynessScoreRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO busyness_score (user_id, date, score, breakdown)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, date)
             DO UPDATE SET score = EXCLUDED.score, breakdown = EXCLUDED.breakdown",
        )
        .bind(record.user)
        .bind(record.date)
        .bind(record.score)
        .bind(serde_json::to_value(&record.breakdown)?)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fetch(&self, user: Uuid, date: NaiveDate) -> Result<Option<BusynessScoreRecord>> {
        let row = sqlx::query(
            "SELECT user_id, date, score, breakdown FROM busyness_score
             WHERE user_id = $1 AND date = $2",
        )
        .bind(user)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        row.map(Self::parse_row).transpose()
    }
}

/// PostgreSQL implementation of BonusScoreRepository.
pub struct PgBonusScoreRepository {
    pool: Pool<Postgres>,
}

impl PgBonusScoreRepository {
    /// Create a new PgBonusScoreRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Result<BonusScoreRecord> {
        let breakdown: JsonValue = row.get("breakdown");
        Ok(BonusScoreRecord {
            user: row.get("user_id"),
            week_start: row.get("week_start"),
            total_bonus: row.get("total_bonus"),
            breakdown: serde_json::from_value(breakdown)?,
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl BonusScoreRepository for PgBonusScoreRepository {
    async fn fetch(&self, user: Uuid, week_start: NaiveDate) -> Result<Option<BonusScoreRecord>> {
        let row = sqlx::query(
            "SELECT user_id, week_start, total_bonus, breakdown, updated_at FROM bonus_score
             WHERE user_id = $1 AND week_start = $2",
        )
        .bind(user)
        .bind(week_start)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        row.map(Self::parse_row).transpose()
    }

    async fn upsert(&self, record: &BonusScoreRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO bonus_score (user_id, week_start, total_bonus, breakdown, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, week_start)
             DO UPDATE SET total_bonus = EXCLUDED.total_bonus, \
                           breakdown = EXCLUDED.breakdown, \
                           updated_at = EXCLUDED.updated_at",
        )
        .bind(record.user)
        .bind(record.week_start)
        .bind(record.total_bonus)
        .bind(serde_json::to_value(&record.breakdown)?)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn list_for_week(&self, week_start: NaiveDate) -> Result<Vec<BonusScoreRecord>> {
        let rows = sqlx::query(
            "SELECT user_id, week_start, total_bonus, breakdown, updated_at FROM bonus_score
             WHERE week_start = $1
             ORDER BY total_bonus DESC",
        )
        .bind(week_start)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        rows.into_iter().map(Self::parse_row).collect()
    }
}
