use crate::error::{map_insert_error, map_sqlx_error};
use crate::row::{entry_from_columns, now_unix_seconds, remaining};
use async_trait::async_trait;
use glimpse_core::repository::{ReadRepository, Repository, Result};
use glimpse_core::{Code, ConsumeOutcome, Entry, NewEntry};
use sqlx::{MySqlPool, Row};
use tracing::trace;

const SCHEMA: &str = include_str!("../ddl/mysql/code_entries.sql");

/// MySQL implementation of the repository contract.
///
/// MySQL has no `RETURNING`, so consumption runs in a transaction that
/// takes a row lock with `SELECT ... FOR UPDATE`, decides, increments and
/// commits. Only the row for the requested code is locked. If the
/// transaction is dropped before commit, nothing is changed.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `code_entries` table if it does not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn get(&self, code: &Code) -> Result<Option<Entry>> {
        let row = sqlx::query(
            r#"
            SELECT payload, maxviews, views, last_viewed_at
            FROM code_entries
            WHERE code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let entry = entry_from_columns(
            code,
            row.try_get("payload").map_err(map_sqlx_error)?,
            row.try_get("maxviews").map_err(map_sqlx_error)?,
            row.try_get("views").map_err(map_sqlx_error)?,
            row.try_get("last_viewed_at").map_err(map_sqlx_error)?,
        )?;
        Ok(Some(entry))
    }

    async fn exists(&self, code: &Code) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM code_entries
            WHERE code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, code: &Code, entry: NewEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO code_entries (code, payload, maxviews, views, last_viewed_at)
            VALUES (?, ?, ?, 0, NULL)
            "#,
        )
        .bind(code.as_str())
        .bind(entry.payload())
        .bind(i64::from(entry.max_views()))
        .execute(&self.pool)
        .await
        .map_err(|err| map_insert_error(code, err))?;

        Ok(())
    }

    async fn try_consume(&self, code: &Code) -> Result<ConsumeOutcome> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(
            r#"
            SELECT payload, maxviews, views
            FROM code_entries
            WHERE code = ?
            FOR UPDATE
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(ConsumeOutcome::NotFound);
        };

        let max_views: i64 = row.try_get("maxviews").map_err(map_sqlx_error)?;
        let views: i64 = row.try_get("views").map_err(map_sqlx_error)?;
        if views >= max_views {
            tx.rollback().await.map_err(map_sqlx_error)?;
            trace!(code = %code, "consume: exhausted");
            return Ok(ConsumeOutcome::Exhausted);
        }

        let payload: String = row.try_get("payload").map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            UPDATE code_entries
            SET views = views + 1,
                last_viewed_at = ?
            WHERE code = ?
            "#,
        )
        .bind(now_unix_seconds())
        .bind(code.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(ConsumeOutcome::Consumed {
            payload,
            remaining: remaining(max_views, views + 1)?,
        })
    }
}
