//! User directory implementation.
//!
//! Authentication lives outside this system; the directory only exposes the
//! set of known user ids so the daily sweep can iterate the full population.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use cadence_core::{Error, Result, UserDirectory};

/// PostgreSQL implementation of UserDirectory.
pub struct PgUserDirectory {
    pool: Pool<Postgres>,
}

impl PgUserDirectory {
    /// Create a new PgUserDirectory with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn list_user_ids(&self) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM app_user ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(ids)
    }
}
