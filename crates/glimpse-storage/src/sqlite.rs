use crate::error::{map_insert_error, map_sqlx_error};
use crate::row::{entry_from_columns, now_unix_seconds, remaining};
use async_trait::async_trait;
use glimpse_core::repository::{ReadRepository, Repository, Result};
use glimpse_core::{Code, ConsumeOutcome, Entry, NewEntry};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::trace;

const SCHEMA: &str = include_str!("../ddl/sqlite/code_entries.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite implementation of the repository contract.
///
/// Consumption is a single conditional `UPDATE ... RETURNING`: the row is
/// only touched while `views < maxviews`, so the check and the increment
/// cannot be split by another writer.
///
/// SQLite admits one writer per database file, so consumes of different
/// codes still queue behind each other. [`InMemoryRepository`] and
/// [`MySqlRepository`] lock per code and are the backends to use when
/// many codes are read at once.
///
/// [`InMemoryRepository`]: crate::InMemoryRepository
/// [`MySqlRepository`]: crate::MySqlRepository
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a repository from an existing SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database at `database_url`, e.g.
    /// `sqlite://codes.db`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// The pool keeps exactly one connection alive for its whole lifetime,
    /// since every new connection to `:memory:` would see an empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(map_sqlx_error)?;
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        let repo = Self::new(pool);
        repo.init_schema().await?;
        Ok(repo)
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
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ReadRepository for SqliteRepository {
    async fn get(&self, code: &Code) -> Result<Option<Entry>> {
        let row = sqlx::query(
            r#"
            SELECT payload, maxviews, views, last_viewed_at
            FROM code_entries
            WHERE code = ?
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
        let exists = sqlx::query("SELECT 1 FROM code_entries WHERE code = ?")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .is_some();

        Ok(exists)
    }
}

#[async_trait]
impl Repository for SqliteRepository {
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
        let now = now_unix_seconds();

        loop {
            let consumed = sqlx::query(
                r#"
                UPDATE code_entries
                SET views = views + 1,
                    last_viewed_at = ?
                WHERE code = ?
                  AND views < maxviews
                RETURNING payload, maxviews, views
                "#,
            )
            .bind(now)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            if let Some(row) = consumed {
                let payload: String = row.try_get("payload").map_err(map_sqlx_error)?;
                let max_views: i64 = row.try_get("maxviews").map_err(map_sqlx_error)?;
                let views: i64 = row.try_get("views").map_err(map_sqlx_error)?;
                return Ok(ConsumeOutcome::Consumed {
                    payload,
                    remaining: remaining(max_views, views)?,
                });
            }

            // The update matched nothing: either no such row, or no view left.
            let state = sqlx::query("SELECT maxviews, views FROM code_entries WHERE code = ?")
                .bind(code.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

            let Some(row) = state else {
                return Ok(ConsumeOutcome::NotFound);
            };

            let max_views: i64 = row.try_get("maxviews").map_err(map_sqlx_error)?;
            let views: i64 = row.try_get("views").map_err(map_sqlx_error)?;
            if views >= max_views {
                return Ok(ConsumeOutcome::Exhausted);
            }

            // Inserted between the two statements; views only grow, so retry.
            trace!(code = %code, "entry appeared during consume, retrying");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_core::StorageError;
    use std::sync::Arc;
    use tokio::sync::Barrier;

    fn code(s: &str) -> Code {
        Code::new_unchecked(s)
    }

    fn new_entry(payload: &str, max_views: u32) -> NewEntry {
        NewEntry::new(payload, max_views).unwrap()
    }

    #[tokio::test]
    async fn insert_and_get() {
        let repo = SqliteRepository::in_memory().await.unwrap();

        repo.insert(&code("ABC123"), new_entry(r#"{"a":"ü"}"#, 20))
            .await
            .unwrap();

        let entry = repo.get(&code("ABC123")).await.unwrap().unwrap();
        assert_eq!(entry.code.as_str(), "ABC123");
        assert_eq!(entry.payload, r#"{"a":"ü"}"#);
        assert_eq!(entry.max_views, 20);
        assert_eq!(entry.views, 0);
        assert_eq!(entry.last_viewed_at, None);
    }

    #[tokio::test]
    async fn init_schema_is_idempotent() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.init_schema().await.unwrap();
    }

    #[tokio::test]
    async fn insert_conflict() {
        let repo = SqliteRepository::in_memory().await.unwrap();

        repo.insert(&code("ABC123"), new_entry("{}", 1))
            .await
            .unwrap();
        let err = repo
            .insert(&code("ABC123"), new_entry("{}", 1))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DuplicateCode(c) if c == "ABC123"));
    }

    #[tokio::test]
    async fn exists_checks() {
        let repo = SqliteRepository::in_memory().await.unwrap();

        assert!(!repo.exists(&code("ABC123")).await.unwrap());
        repo.insert(&code("ABC123"), new_entry("{}", 1))
            .await
            .unwrap();
        assert!(repo.exists(&code("ABC123")).await.unwrap());
    }

    #[tokio::test]
    async fn two_views_then_exhausted() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let c = code("ABC123");
        repo.insert(&c, new_entry("payload", 2)).await.unwrap();

        assert_eq!(
            repo.try_consume(&c).await.unwrap(),
            ConsumeOutcome::Consumed {
                payload: "payload".to_string(),
                remaining: 1
            }
        );
        assert_eq!(
            repo.try_consume(&c).await.unwrap(),
            ConsumeOutcome::Consumed {
                payload: "payload".to_string(),
                remaining: 0
            }
        );
        assert_eq!(
            repo.try_consume(&c).await.unwrap(),
            ConsumeOutcome::Exhausted
        );

        let entry = repo.get(&c).await.unwrap().unwrap();
        assert_eq!(entry.views, 2);
        assert!(entry.last_viewed_at.is_some());
    }

    #[tokio::test]
    async fn consume_nonexistent_is_not_found() {
        let repo = SqliteRepository::in_memory().await.unwrap();

        for _ in 0..3 {
            assert_eq!(
                repo.try_consume(&code("NOPE")).await.unwrap(),
                ConsumeOutcome::NotFound
            );
        }
        assert!(!repo.exists(&code("NOPE")).await.unwrap());
    }

    #[tokio::test]
    async fn schema_rejects_views_above_max() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.insert(&code("ABC123"), new_entry("{}", 1))
            .await
            .unwrap();

        let result = sqlx::query("UPDATE code_entries SET views = 2 WHERE code = 'ABC123'")
            .execute(repo.pool())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn closed_pool_is_unavailable() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.pool().close().await;

        let err = repo.try_consume(&code("ABC123")).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_consumers_on_shared_file() {
        const MAX_VIEWS: u32 = 5;
        const CALLERS: usize = 24;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("codes.db").display());
        let repo = Arc::new(SqliteRepository::connect(&url).await.unwrap());
        repo.init_schema().await.unwrap();

        let c = code("RACE01");
        repo.insert(&c, new_entry("secret", MAX_VIEWS)).await.unwrap();

        let barrier = Arc::new(Barrier::new(CALLERS));
        let mut handles = Vec::with_capacity(CALLERS);
        for _ in 0..CALLERS {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            let c = c.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                repo.try_consume(&c).await.unwrap()
            }));
        }

        let mut remaining = Vec::new();
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                ConsumeOutcome::Consumed { remaining: r, .. } => remaining.push(r),
                ConsumeOutcome::Exhausted => exhausted += 1,
                ConsumeOutcome::NotFound => panic!("entry vanished"),
            }
        }

        remaining.sort_unstable();
        assert_eq!(remaining, (0..MAX_VIEWS).collect::<Vec<_>>());
        assert_eq!(exhausted, CALLERS - MAX_VIEWS as usize);
        assert_eq!(repo.get(&c).await.unwrap().unwrap().views, MAX_VIEWS);
    }
}
