use task_tracker_rs::{ServerConfig, TaskServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    match &config.data_dir {
        Some(dir) => tracing::info!(data_dir = %dir.display(), "persisting to disk"),
        None => tracing::warn!("TASK_TRACKER_DATA_DIR not set, data is kept in memory only"),
    }

    let server = TaskServer::new(&config)?;
    if let Err(err) = server.start().await {
        tracing::error!(error = %err, "server error");
        return Err(err);
    }
    Ok(())
}
