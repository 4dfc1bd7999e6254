//! Runtime configuration, from the command line or the environment.
use super::history::{HistoryStore, MemoryStore, PgStore, StoreError};
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};

/// Configuration for the calculator service.
#[derive(Clone, Debug, Parser)]
#[command(name = "hypercalc", version, about)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "HYPERCALC_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// PostgreSQL connection string for the history. History is kept in memory when unset.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "HYPERCALC_POOL_SIZE", default_value_t = 8)]
    pub pool_size: usize,
}

impl Config {
    /// Open the history store this configuration describes.
    pub async fn open_store(&self) -> Result<Arc<dyn HistoryStore>, StoreError> {
        match &self.database_url {
            Some(url) => Ok(Arc::new(PgStore::connect(url, self.pool_size).await?)),
            None => {
                tracing::warn!("DATABASE_URL is not set, history will not survive a restart");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}
