//! Persistence of evaluated expressions.
//!
//! Records are append-only: once stored they are never updated or deleted. Writes go through a
//! [Recorder], which keeps them in request order and keeps their failures away from the request
//! that produced them.
use super::{
    eval::Expression,
    reply::{self, Reply},
    Response,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyper::StatusCode;
use thiserror::Error;

mod memory;
mod postgres;
mod recorder;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use recorder::Recorder;

/// How many records the latest-first view shows.
pub const LATEST: usize = 20;

/// A persisted expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub question: String,
    pub answer: f64,
    /// Assigned by the store when the record is written.
    pub timestamp: DateTime<Utc>,
}

impl Record {
    /// Project this record down to its question and answer.
    pub fn expression(&self) -> Expression {
        Expression {
            question: self.question.clone(),
            answer: self.answer,
        }
    }
}

/// An error encountered while talking to a history store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A connection could not be checked out of the pool.
    #[error("connection pool error: {}", .0)]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The connection pool could not be created.
    #[error("invalid pool configuration: {}", .0)]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// A query failed.
    #[error("query failed: {}", .0)]
    Query(#[from] tokio_postgres::Error),

    /// The store refuses to serve requests (closed, or otherwise unreachable).
    #[error("store unavailable: {}", .0)]
    Unavailable(String),
}

impl Reply for StoreError {
    #[inline]
    fn into_response(self) -> Response {
        reply::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

/// A durable, append-only log of expressions.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist `expr`, stamping it with the current time.
    async fn append(&self, expr: &Expression) -> Result<Record, StoreError>;

    /// All records, in the order the store holds them.
    async fn list_all(&self) -> Result<Vec<Expression>, StoreError>;

    /// The `n` most recent records, newest first. Records with equal timestamps are ordered by
    /// insertion, the later insert first.
    async fn list_latest(&self, n: usize) -> Result<Vec<Expression>, StoreError>;

    /// Release any resources held by the store.
    async fn close(&self) {}
}
