//! SQLite record store.
//!
//! A file-based store shared across runs and across processes. Uniqueness of
//! the identifier is enforced by the `UNIQUE` constraint and a single
//! `INSERT ... ON CONFLICT DO NOTHING`, so the check and the write are one
//! atomic statement. Each operation acquires its own pooled connection and
//! releases it on every exit path.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::schema::Record;
use crate::traits::store::{InsertOutcome, RecordStore};

/// SQLite-based record store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at the given URL.
    ///
    /// # Example URLs
    /// - `sqlite://repositories.db` - File-based database
    /// - `sqlite::memory:` - In-memory database (ephemeral, see [`Self::in_memory`])
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!(database_url = %database_url, "Repository database initialized");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// Pinned to one long-lived connection, since every SQLite in-memory
    /// connection is its own database.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS repositories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identifier TEXT NOT NULL UNIQUE,
                url TEXT NOT NULL,
                summary TEXT NOT NULL,
                popularity INTEGER NOT NULL,
                primary_language TEXT NOT NULL DEFAULT '',
                rationale TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Close the pool, waiting for connections to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    identifier: String,
    url: String,
    summary: String,
    popularity: i64,
    primary_language: String,
    rationale: String,
}

impl RecordRow {
    fn into_record(self) -> StoreResult<Record> {
        let popularity = u64::try_from(self.popularity).map_err(|_| StoreError::OutOfRange {
            identifier: self.identifier.clone(),
            value: self.popularity.to_string(),
        })?;

        Ok(Record {
            identifier: self.identifier,
            url: self.url,
            summary: self.summary,
            popularity,
            primary_language: self.primary_language,
            rationale: self.rationale,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert(&self, record: &Record) -> StoreResult<InsertOutcome> {
        let popularity = i64::try_from(record.popularity).map_err(|_| StoreError::OutOfRange {
            identifier: record.identifier.clone(),
            value: record.popularity.to_string(),
        })?;

        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO repositories (identifier, url, summary, popularity, primary_language, rationale)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(identifier) DO NOTHING
            "#,
        )
        .bind(&record.identifier)
        .bind(&record.url)
        .bind(&record.summary)
        .bind(popularity)
        .bind(&record.primary_language)
        .bind(&record.rationale)
        .execute(&mut *conn)
        .await?;

        let outcome = if result.rows_affected() == 1 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::AlreadyExists
        };

        debug!(identifier = %record.identifier, outcome = ?outcome, "Insert complete");
        Ok(outcome)
    }

    async fn read_all(&self) -> StoreResult<Vec<Record>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT identifier, url, summary, popularity, primary_language, rationale
            FROM repositories
            ORDER BY popularity DESC, id ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_record;

    async fn test_store() -> SqliteStore {
        SqliteStore::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_duplicate() {
        let store = test_store().await;

        let first = sample_record("tokio-rs/tokio", 27000);
        let mut second = sample_record("tokio-rs/tokio", 1);
        second.summary = "A different summary.".to_string();
        second.primary_language = "C".to_string();

        assert_eq!(store.insert(&first).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(
            store.insert(&second).await.unwrap(),
            InsertOutcome::AlreadyExists
        );

        let all = store.read_all().await.unwrap();
        assert_eq!(all, vec![first]);
    }

    #[tokio::test]
    async fn test_read_all_orders_by_popularity_then_insertion() {
        let store = test_store().await;

        let inserts = [
            ("a/ten", 10),
            ("a/first500", 500),
            ("a/second500", 500),
            ("a/one", 1),
        ];
        for (identifier, popularity) in inserts {
            store
                .insert(&sample_record(identifier, popularity))
                .await
                .unwrap();
        }

        let ordered: Vec<(String, u64)> = store
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.identifier, r.popularity))
            .collect();

        assert_eq!(
            ordered,
            vec![
                ("a/first500".to_string(), 500),
                ("a/second500".to_string(), 500),
                ("a/ten".to_string(), 10),
                ("a/one".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_store_reads_empty() {
        let store = test_store().await;
        assert!(store.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_popularity_is_store_error() {
        let store = test_store().await;
        let record = sample_record("a/huge", u64::MAX);

        let err = store.insert(&record).await.unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { .. }));
        assert!(store.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!("repo-scout-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite://{}", path.display());

        {
            let store = SqliteStore::new(&url).await.unwrap();
            store
                .insert(&sample_record("rust-lang/rust", 100000))
                .await
                .unwrap();
            store.close().await;
        }

        let reopened = SqliteStore::new(&url).await.unwrap();
        let all = reopened.read_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].identifier, "rust-lang/rust");
        reopened.close().await;

        let _ = std::fs::remove_file(&path);
    }
}
