use clap::Parser;
use tracing::{info, warn};

use movie_catalog::{http, logging, MovieStore, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;

    let config = ServerConfig::parse();
    let (store, worker) = MovieStore::open(&config.data_file)?;

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    info!(data = %config.data_file.display(), "server is running");
    http::serve(listener, store.clone(), shutdown_signal()).await?;

    // Waiting on the flush worker blocks, so keep it off the async workers.
    let stats = tokio::task::spawn_blocking(move || {
        if let Err(err) = store.sync() {
            warn!(error = %err, "last snapshot was not written");
        }
        worker.stop()
    })
    .await?;
    info!(
        written = stats.snapshots_written,
        coalesced = stats.snapshots_coalesced,
        failures = stats.failures,
        "shut down"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
