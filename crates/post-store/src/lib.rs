//! SQLite-backed post record store.
//!
//! One row per ingested post; tickers stored as a comma-joined string and
//! sentiment columns NULL until the classification pass fills them in.
//! Inserting an id that already exists is a no-op, which makes ingestion
//! idempotent across overlapping scrape runs.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use sentiment_core::{Post, Sentiment, SentimentLabel};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row for post {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

pub struct PostStore {
    pool: SqlitePool,
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the posts table and indexes if absent.
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '',
                author TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                score INTEGER NOT NULL,
                tickers TEXT NOT NULL,
                sentiment TEXT,
                sentiment_score REAL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a post, ignoring duplicates. Returns whether a row was
    /// actually inserted.
    pub async fn upsert_ignore(&self, post: &Post) -> Result<bool, StoreError> {
        let tickers: Vec<&str> = post.tickers.iter().map(String::as_str).collect();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO posts
             (id, title, body, author, created_at, score, tickers, sentiment, sentiment_score)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.body)
        .bind(&post.author)
        .bind(post.created_at.timestamp())
        .bind(post.score)
        .bind(tickers.join(","))
        .bind(post.sentiment.map(|s| s.label.as_str()))
        .bind(post.sentiment.map(|s| s.score))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Posts the sentiment pass has not touched yet.
    pub async fn find_missing_sentiment(&self) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, body, author, created_at, score, tickers, sentiment, sentiment_score
             FROM posts WHERE sentiment IS NULL ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_post).collect()
    }

    /// Set sentiment for one post. The selection in
    /// [`find_missing_sentiment`] is NULL-only, so populated sentiment is
    /// never rewritten by the batch pass.
    pub async fn update_sentiment(
        &self,
        id: &str,
        label: SentimentLabel,
        score: f64,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE posts SET sentiment = ?, sentiment_score = ? WHERE id = ?")
            .bind(label.as_str())
            .bind(score)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All posts mentioning `symbol` created at or after `since`, oldest
    /// first.
    pub async fn query_by_symbol_and_time(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, body, author, created_at, score, tickers, sentiment, sentiment_score
             FROM posts WHERE tickers LIKE ? AND created_at >= ? ORDER BY created_at",
        )
        .bind(format!("%{symbol}%"))
        .bind(since.timestamp())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_post).collect()
    }

    /// Retention cleanup: delete whole records older than `age`. Returns
    /// the number of rows removed.
    pub async fn delete_older_than(&self, age: Duration) -> Result<u64, StoreError> {
        let cutoff = (Utc::now() - age).timestamp();
        let result = sqlx::query("DELETE FROM posts WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::info!(deleted, "removed posts past retention window");
        }
        Ok(deleted)
    }
}

fn row_to_post(row: &SqliteRow) -> Result<Post, StoreError> {
    let id: String = row.get("id");
    let created_at: i64 = row.get("created_at");
    let created_at =
        DateTime::from_timestamp(created_at, 0).ok_or_else(|| StoreError::Corrupt {
            id: id.clone(),
            reason: format!("bad timestamp {created_at}"),
        })?;

    let tickers_raw: String = row.get("tickers");
    let tickers: BTreeSet<String> = tickers_raw
        .split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    let sentiment = match row.get::<Option<String>, _>("sentiment") {
        Some(label_raw) => {
            let label =
                SentimentLabel::from_str(&label_raw).map_err(|reason| StoreError::Corrupt {
                    id: id.clone(),
                    reason,
                })?;
            let score = row
                .get::<Option<f64>, _>("sentiment_score")
                .ok_or_else(|| StoreError::Corrupt {
                    id: id.clone(),
                    reason: "sentiment label without score".to_string(),
                })?;
            Some(Sentiment { label, score })
        }
        None => None,
    };

    Ok(Post {
        id,
        title: row.get("title"),
        body: row.get("body"),
        author: row.get("author"),
        created_at,
        score: row.get("score"),
        tickers,
        sentiment,
    })
}
