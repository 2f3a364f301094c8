//! Todo repository implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use cadence_core::{DayWindow, Error, Result, Todo, TodoRepository};

const TODO_COLUMNS: &str = "id, owner, project, category, title, date, deadline, difficulty, \
     completed, repeat, created_at, updated_at";

/// PostgreSQL implementation of TodoRepository.
///
/// The recurrence rule persists as a tagged JSONB document; queries
/// discriminate on `repeat->>'type'` and read the end bound through
/// `repeat->>'end_date'`.
pub struct PgTodoRepository {
    pool: Pool<Postgres>,
}

impl PgTodoRepository {
    /// Create a new PgTodoRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a todo row into a Todo struct.
    fn parse_todo_row(row: sqlx::postgres::PgRow) -> Result<Todo> {
        let repeat: JsonValue = row.get("repeat");
        Ok(Todo {
            id: row.get("id"),
            owner: row.get("owner"),
            project: row.get("project"),
            category: row.get("category"),
            title: row.get("title"),
            date: row.get("date"),
            deadline: row.get("deadline"),
            difficulty: row.get("difficulty"),
            completed: row.get("completed"),
            repeat: serde_json::from_value(repeat)?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn parse_todo_rows(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<Todo>> {
        rows.into_iter().map(Self::parse_todo_row).collect()
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn insert(&self, todo: &Todo) -> Result<()> {
        sqlx::query(
            "INSERT INTO todo (id, owner, project, category, title, date, deadline, difficulty, \
             completed, repeat, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(todo.id)
        .bind(todo.owner)
        .bind(todo.project)
        .bind(todo.category)
        .bind(&todo.title)
        .bind(todo.date)
        .bind(todo.deadline)
        .bind(todo.difficulty)
        .bind(todo.completed)
        .bind(serde_json::to_value(&todo.repeat)?)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn insert_bulk(&self, todos: &[Todo]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        for todo in todos {
            sqlx::query(
                "INSERT INTO todo (id, owner, project, category, title, date, deadline, \
                 difficulty, completed, repeat, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(todo.id)
            .bind(todo.owner)
            .bind(todo.project)
            .bind(todo.category)
            .bind(&todo.title)
            .bind(todo.date)
            .bind(todo.deadline)
            .bind(todo.difficulty)
            .bind(todo.completed)
            .bind(serde_json::to_value(&todo.repeat)?)
            .bind(todo.created_at)
            .bind(todo.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn fetch_owned(&self, id: Uuid, owner: Uuid) -> Result<Todo> {
        let row = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todo WHERE id = $1 AND owner = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Self::parse_todo_row(row),
            None => Err(Error::NotFound(format!("todo {id}"))),
        }
    }

    async fn fetch_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Todo>> {
        let rows = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todo WHERE id = ANY($1) ORDER BY created_at"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Self::parse_todo_rows(rows)
    }

    async fn update(&self, todo: &Todo) -> Result<()> {
        sqlx::query(
            "UPDATE todo
             SET project = $2, category = $3, title = $4, date = $5, deadline = $6, \
                 difficulty = $7, completed = $8, repeat = $9, updated_at = $10
             WHERE id = $1",
        )
        .bind(todo.id)
        .bind(todo.project)
        .bind(todo.category)
        .bind(&todo.title)
        .bind(todo.date)
        .bind(todo.deadline)
        .bind(todo.difficulty)
        .bind(todo.completed)
        .bind(serde_json::to_value(&todo.repeat)?)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn set_repeat_end(&self, id: Uuid, end_date: Option<NaiveDate>) -> Result<()> {
        sqlx::query(
            "UPDATE todo
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

    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<()> {
        sqlx::query("UPDATE todo SET completed = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(completed)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM todo WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn list_one_off_due(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        day: NaiveDate,
    ) -> Result<Vec<Todo>> {
        let rows = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todo
             WHERE owner = $1
               AND ($2::uuid IS NULL OR project = $2)
               AND repeat->>'type' = 'none'
               AND ((date IS NOT NULL AND deadline IS NULL AND date = $3)
                 OR (date IS NULL AND deadline IS NOT NULL AND deadline >= $3))
             ORDER BY created_at"
        ))
        .bind(owner)
        .bind(project)
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Self::parse_todo_rows(rows)
    }

    async fn list_one_off_open_in_window(
        &self,
        owner: Uuid,
        window: DayWindow,
    ) -> Result<Vec<Todo>> {
        let rows = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todo
             WHERE owner = $1
               AND completed = FALSE
               AND repeat->>'type' = 'none'
               AND ((date >= $2 AND date <= $3) OR (deadline >= $2 AND deadline <= $3))
             ORDER BY created_at"
        ))
        .bind(owner)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Self::parse_todo_rows(rows)
    }

    async fn list_one_off_completed_on(&self, owner: Uuid, day: NaiveDate) -> Result<Vec<Todo>> {
        let rows = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todo
             WHERE owner = $1
               AND completed = TRUE
               AND repeat->>'type' = 'none'
               AND ((date IS NOT NULL AND deadline IS NULL AND date = $2)
                 OR (date IS NULL AND deadline IS NOT NULL AND deadline >= $2))
             ORDER BY created_at"
        ))
        .bind(owner)
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Self::parse_todo_rows(rows)
    }

    async fn list_recurring_reaching(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        window: DayWindow,
    ) -> Result<Vec<Todo>> {
        let rows = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todo
             WHERE owner = $1
               AND ($2::uuid IS NULL OR project = $2)
               AND repeat->>'type' <> 'none'
               AND date IS NOT NULL AND date <= $4
               AND (repeat->>'end_date' IS NULL OR (repeat->>'end_date')::date >= $3)
             ORDER BY created_at"
        ))
        .bind(owner)
        .bind(project)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Self::parse_todo_rows(rows)
    }
}
