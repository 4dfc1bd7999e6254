use anyhow::Context;
use clap::Parser;
use hypercalc::{config::Config, App};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hypercalc=info")),
        )
        .init();

    let config = Config::parse();

    let store = (config.open_store().await).context("failed to open the history store")?;
    let app = Arc::new(App::new(store));

    (app.clone().serve(config.listen, shutdown_signal()).await)
        .with_context(|| format!("failed to serve on {}", config.listen))?;

    app.shutdown().await;
    tracing::info!("bye");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for ctrl-c, running until killed: {}", e);
        futures::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
