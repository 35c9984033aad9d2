use crate::models::{ClickEvent, ShortLink, UrlRecord};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid SQLite URL {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        if !database_url.contains(":memory:") {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urls (
                shortcode TEXT PRIMARY KEY NOT NULL,
                long_url TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expiry TEXT NOT NULL,
                click_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS click_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                shortcode TEXT NOT NULL REFERENCES urls(shortcode) ON DELETE CASCADE,
                clicked_at TEXT NOT NULL,
                referrer TEXT NOT NULL,
                location TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_click_logs_shortcode ON click_logs(shortcode, id)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn insert(&self, link: &ShortLink) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO urls (shortcode, long_url, created_at, expiry, click_count)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(shortcode) DO NOTHING
            "#,
        )
        .bind(&link.shortcode)
        .bind(&link.long_url)
        .bind(link.created_at)
        .bind(link.expiry)
        .bind(link.click_count)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        Ok(())
    }

    async fn lookup(&self, shortcode: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT shortcode, long_url, created_at, expiry, click_count
            FROM urls
            WHERE shortcode = ?
            "#,
        )
        .bind(shortcode)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn record_click(&self, shortcode: &str, click: &ClickEvent) -> StorageResult<ShortLink> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Other(e.into()))?;

        // The counter UPDATE must be the first statement so the write lock is taken
        // before any read snapshot exists.
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            UPDATE urls
            SET click_count = click_count + 1
            WHERE shortcode = ?
            RETURNING shortcode, long_url, created_at, expiry, click_count
            "#,
        )
        .bind(shortcode)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StorageError::Other(e.into()))?
        .ok_or(StorageError::NotFound)?;

        sqlx::query(
            r#"
            INSERT INTO click_logs (shortcode, clicked_at, referrer, location)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(shortcode)
        .bind(click.timestamp)
        .bind(&click.referrer)
        .bind(&click.location)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Other(e.into()))?;

        Ok(link)
    }

    async fn load_record(&self, shortcode: &str) -> Result<Option<UrlRecord>> {
        let mut tx = self.pool.begin().await?;

        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT shortcode, long_url, created_at, expiry, click_count
            FROM urls
            WHERE shortcode = ?
            "#,
        )
        .bind(shortcode)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(link) = link else {
            return Ok(None);
        };

        let click_logs = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT clicked_at, referrer, location
            FROM click_logs
            WHERE shortcode = ?
            ORDER BY id ASC
            "#,
        )
        .bind(shortcode)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(UrlRecord { link, click_logs }))
    }

    async fn delete(&self, shortcode: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM urls
            WHERE shortcode = ?
            "#,
        )
        .bind(shortcode)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
