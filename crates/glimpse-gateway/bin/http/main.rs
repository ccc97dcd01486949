mod cli;

use crate::cli::{StorageBackendArg, CLI};
use clap::Parser;
use glimpse_gateway::{App, AppState};
use glimpse_storage::{InMemoryRepository, MySqlRepository, SqliteRepository};
use glimpse_viewer::{Viewer, ViewerService};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    glimpse_telemetry::init(config.log_format.into())?;

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        "starting gateway"
    );

    let viewer: Arc<dyn Viewer> = match config.storage {
        StorageBackendArg::InMemory => {
            warn!("in-memory backend selected, entries live only as long as this process");
            Arc::new(ViewerService::new(InMemoryRepository::new()))
        }
        StorageBackendArg::Sqlite => {
            let repository = SqliteRepository::connect(&config.database_url).await?;
            repository.init_schema().await?;
            Arc::new(ViewerService::new(repository))
        }
        StorageBackendArg::Mysql => {
            let repository = MySqlRepository::connect(&config.database_url).await?;
            repository.init_schema().await?;
            Arc::new(ViewerService::new(repository))
        }
    };

    let router = App::router(AppState::new(viewer));
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down gateway");
        })
        .await?;

    Ok(())
}
