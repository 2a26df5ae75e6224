use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;

use autobus_persistence::{
    StoreCleanup, connection::connect_and_migrate, repositories::StoreEntryRepository,
};
use autobus_store_server::{config::Config, create_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting Autobus store server...");

    let config = Config::from_env()?;

    let db = connect_and_migrate()
        .await
        .context("Failed to connect to database and run migrations")?;
    let repository = Arc::new(StoreEntryRepository::new(db));

    let routes = create_routes(repository.clone(), config.max_value_bytes);

    // Expire abandoned rooms
    let cleanup = StoreCleanup::new(config.entry_ttl());
    let cleanup_interval = config.cleanup_interval();
    let cleanup_repository = repository.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            if let Err(e) = cleanup.purge_expired(&cleanup_repository).await {
                tracing::error!("Store cleanup failed: {}", e);
            }
        }
    });

    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.host))?;

    #[cfg(unix)]
    let (mut sigint, mut sigterm) = (
        signal::unix::signal(signal::unix::SignalKind::interrupt())?,
        signal::unix::signal(signal::unix::SignalKind::terminate())?,
    );

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((host, config.port), async move {
            #[cfg(unix)]
            {
                tokio::select! {
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully...");
                    }
                }
            }

            #[cfg(not(unix))]
            {
                if signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C, shutting down gracefully...");
                }
            }
        });

    info!("Store server listening on {}. Press Ctrl+C to stop.", addr);
    server.await;
    info!("Server shutdown complete.");
    Ok(())
}
