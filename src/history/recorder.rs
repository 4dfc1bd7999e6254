use super::HistoryStore;
use crate::eval::Expression;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot, Mutex},
    task::JoinHandle,
};

/// How many writes may wait for the writer task before callers start to queue behind them.
const BACKLOG: usize = 256;

enum Command {
    Append(Expression, oneshot::Sender<()>),
    Shutdown,
}

/// The write side of a [HistoryStore].
///
/// A single background task appends records in the order they were handed over. Callers wait
/// for their write to be attempted but never see it fail; failures are logged and the record is
/// dropped.
#[derive(Clone)]
pub struct Recorder {
    tx: mpsc::Sender<Command>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Recorder {
    /// Start a writer task for `store`.
    ///
    /// # Panics
    /// This panics if called outside of a tokio runtime.
    pub fn spawn(store: Arc<dyn HistoryStore>) -> Self {
        let (tx, rx) = mpsc::channel(BACKLOG);
        let task = tokio::spawn(run(store, rx));

        Self {
            tx,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    /// Persist `expr`, returning once the write has been attempted. A record handed over after
    /// [Recorder::shutdown] is dropped.
    pub async fn record(&self, expr: Expression) {
        let (done, attempted) = oneshot::channel();

        match self.tx.send(Command::Append(expr, done)).await {
            Ok(()) => {
                let _ = attempted.await;
            }

            Err(mpsc::error::SendError(cmd)) => {
                if let Command::Append(expr, _) = cmd {
                    tracing::warn!("history recorder is stopped, dropping {:?}", expr.question);
                }
            }
        }
    }

    /// Write everything still queued, close the store, and stop the writer task. Every caller
    /// returns only once the store is closed.
    pub async fn shutdown(&self) {
        let mut task = self.task.lock().await;

        if let Some(handle) = task.take() {
            let _ = self.tx.send(Command::Shutdown).await;

            if let Err(e) = handle.await {
                tracing::error!("history recorder failed: {}", e);
            }
        }
    }
}

async fn run(store: Arc<dyn HistoryStore>, mut rx: mpsc::Receiver<Command>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Append(expr, done) => {
                match store.append(&expr).await {
                    Ok(record) => tracing::debug!(
                        question = %record.question,
                        at = %record.timestamp,
                        "saved expression"
                    ),
                    Err(e) => tracing::error!("failed to save {:?}: {}", expr.question, e),
                }

                let _ = done.send(());
            }

            // drain whatever is already queued, then stop
            Command::Shutdown => rx.close(),
        }
    }

    store.close().await;
    tracing::info!("history recorder stopped");
}
