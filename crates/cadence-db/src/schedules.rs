//! Schedule repository implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cadence_core::{day_end, day_start, DayWindow, Error, Result, Schedule, ScheduleRepository};

const SCHEDULE_COLUMNS: &str =
    "id, owner, project, category, title, start_at, end_at, repeat, created_at, updated_at";

/// PostgreSQL implementation of ScheduleRepository.
pub struct PgScheduleRepository {
    pool: Pool<Postgres>,
}

impl PgScheduleRepository {
    /// Create a new PgScheduleRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a schedule row into a Schedule struct.
    fn parse_schedule_row(row: sqlx::postgres::PgRow) -> Result<Schedule> {
        let repeat: JsonValue = row.get("repeat");
        Ok(Schedule {
            id: row.get("id"),
            owner: row.get("owner"),
            project: row.get("project"),
            category: row.get("category"),
            title: row.get("title"),
            start_at: row.get("start_at"),
            end_at: row.get("end_at"),
            repeat: serde_json::from_value(repeat)?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn parse_schedule_rows(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<Schedule>> {
        rows.into_iter().map(Self::parse_schedule_row).collect()
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn insert(&self, schedule: &Schedule) -> Result<()> {
        sqlx::query(
            "INSERT INTO schedule (id, owner, project, category, title, start_at, end_at, \
             repeat, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(schedule.id)
        .bind(schedule.owner)
        .bind(schedule.project)
        .bind(schedule.category)
        .bind(&schedule.title)
        .bind(schedule.start_at)
        .bind(schedule.end_at)
        .bind(serde_json::to_value(&schedule.repeat)?)
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fetch_owned(&self, id: Uuid, owner: Uuid) -> Result<Schedule> {
        let row = sqlx::query(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedule WHERE id = $1 AND owner = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Self::parse_schedule_row(row),
            None => Err(Error::NotFound(format!("schedule {id}"))),
        }
    }

    async fn update(&self, schedule: &Schedule) -> Result<()> {
        sqlx::query(
            "UPDATE schedule
             SET project = $2, category = $3, title = $4, start_at = $5, end_at = $6, \
                 repeat = $7, updated_at = $8
             WHERE id = $1",
        )
        .bind(schedule.id)
        .bind(schedule.project)
        .bind(schedule.category)
        .bind(&schedule.title)
        .bind(schedule.start_at)
        .bind(schedule.end_at)
        .bind(serde_json::to_value(&schedule.repeat)?)
        .bind(schedule.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn set_repeat_end(&self, id: Uuid, end_date: Option<NaiveDate>) -> Result<()> {
        sqlx::query(
            "UPDATE schedule
             SET repeat = repeat || jsonb_build_object('end_date', $2::date), updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(end_date)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM schedule WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn list_one_off_overlapping(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        window: DayWindow,
    ) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedule
             WHERE owner = $1
               AND ($2::uuid IS NULL OR project = $2)
               AND repeat->>'type' = 'none'
               AND start_at < $4 AND end_at >= $3
             ORDER BY start_at"
        ))
        .bind(owner)
        .bind(project)
        .bind(day_start(window.start))
        .bind(day_end(window.end))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Self::parse_schedule_rows(rows)
    }

    async fn list_recurring_reaching(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        window: DayWindow,
    ) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedule
             WHERE owner = $1
               AND ($2::uuid IS NULL OR project = $2)
               AND repeat->>'type' <> 'none'
               AND start_at < $4
               AND (repeat->>'end_date' IS NULL OR (repeat->>'end_date')::date >= $3)
             ORDER BY start_at"
        ))
        .bind(owner)
        .bind(project)
        .bind(window.start)
        .bind(day_end(window.end))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Self::parse_schedule_rows(rows)
    }
}
