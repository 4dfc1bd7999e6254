use super::{HistoryStore, Record, StoreError};
use crate::eval::Expression;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use std::convert::TryFrom;
use tokio_postgres::{NoTls, Row};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS expressions (
    id BIGSERIAL PRIMARY KEY,
    question TEXT NOT NULL,
    answer DOUBLE PRECISION NOT NULL,
    timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// A [HistoryStore] backed by a PostgreSQL table.
///
/// The `id` column records insertion order, which is both the natural order of
/// [list_all][HistoryStore::list_all] and the tie breaker for equal timestamps.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Connect to the database at `url` and make sure the `expressions` table exists.
    pub async fn connect(url: &str, pool_size: usize) -> Result<Self, StoreError> {
        let mut cfg = Config::new();
        cfg.url = Some(url.to_string());
        cfg.pool = Some(PoolConfig::new(pool_size));

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!("connected to history database");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA).await?;
        Ok(())
    }

    async fn select(&self, query: &str, limit: Option<i64>) -> Result<Vec<Expression>, StoreError> {
        let conn = self.pool.get().await?;

        let rows = match limit {
            Some(n) => conn.query(query, &[&n]).await?,
            None => conn.query(query, &[]).await?,
        };

        Ok(rows.iter().map(expression).collect())
    }
}

fn expression(row: &Row) -> Expression {
    Expression {
        question: row.get("question"),
        answer: row.get("answer"),
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn append(&self, expr: &Expression) -> Result<Record, StoreError> {
        let conn = self.pool.get().await?;

        let row = conn
            .query_one(
                "INSERT INTO expressions (question, answer) VALUES ($1, $2) RETURNING timestamp",
                &[&expr.question, &expr.answer],
            )
            .await?;

        let timestamp: DateTime<Utc> = row.get("timestamp");

        Ok(Record {
            question: expr.question.clone(),
            answer: expr.answer,
            timestamp,
        })
    }

    async fn list_all(&self) -> Result<Vec<Expression>, StoreError> {
        self.select("SELECT question, answer FROM expressions ORDER BY id", None)
            .await
    }

    async fn list_latest(&self, n: usize) -> Result<Vec<Expression>, StoreError> {
        let limit = i64::try_from(n).unwrap_or(i64::MAX);

        self.select(
            "SELECT question, answer FROM expressions ORDER BY timestamp DESC, id DESC LIMIT $1",
            Some(limit),
        )
        .await
    }

    async fn close(&self) {
        self.pool.close();
        tracing::info!("closed history database pool");
    }
}
