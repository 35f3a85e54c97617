//! SQLite score store.
//!
//! Appends one `query_data` row per scored claim.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::{Result, VerificationError};
use crate::traits::store::ScoreStore;
use crate::types::report::ScoredClaimRecord;

/// SQLite-backed [`ScoreStore`].
pub struct SqliteScoreStore {
    pool: SqlitePool,
}

impl SqliteScoreStore {
    /// Connect and create the table if needed.
    ///
    /// # Example URLs
    /// - `sqlite://./scores.db?mode=rwc` - Create if not exists
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::connect(database_url, 5).await
    }

    /// Create an in-memory store (for testing).
    ///
    /// Each SQLite connection sees its own in-memory database, so the pool
    /// holds a single connection.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| VerificationError::Storage(Box::new(e)))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS query_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                input TEXT NOT NULL,
                sim_score REAL NOT NULL,
                source_url TEXT NOT NULL,
                input_embedding TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| VerificationError::Storage(Box::new(e)))?;

        Ok(())
    }

    /// Number of stored rows.
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM query_data")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| VerificationError::Storage(Box::new(e)))
    }
}

#[async_trait]
impl ScoreStore for SqliteScoreStore {
    async fn record(&self, record: &ScoredClaimRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO query_data (input, sim_score, source_url, input_embedding, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.claim)
        .bind(record.top_score)
        .bind(&record.top_url)
        .bind(&record.claim_embedding_json)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| VerificationError::Storage(Box::new(e)))?;

        Ok(())
    }
}
