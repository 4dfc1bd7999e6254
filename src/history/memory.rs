use super::{HistoryStore, Record, StoreError};
use crate::eval::Expression;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A process-local [HistoryStore]. Everything is lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryStore(Arc<Mutex<Vec<Record>>>);

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every record held, timestamps included.
    pub async fn records(&self) -> Vec<Record> {
        self.0.lock().await.clone()
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, expr: &Expression) -> Result<Record, StoreError> {
        let record = Record {
            question: expr.question.clone(),
            answer: expr.answer,
            timestamp: Utc::now(),
        };

        self.0.lock().await.push(record.clone());

        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<Expression>, StoreError> {
        let records = self.0.lock().await;

        Ok(records.iter().map(Record::expression).collect())
    }

    async fn list_latest(&self, n: usize) -> Result<Vec<Expression>, StoreError> {
        let records = self.0.lock().await;

        let mut order: Vec<_> = records.iter().enumerate().collect();
        order.sort_by(|(i, a), (j, b)| (b.timestamp.cmp(&a.timestamp)).then(j.cmp(i)));

        Ok(order.into_iter().take(n).map(|(_, r)| r.expression()).collect())
    }
}
