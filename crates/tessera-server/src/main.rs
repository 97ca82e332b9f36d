//! Tessera server entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tessera_auth::service::AuthService;
use tessera_cache::RedisCacheStore;
use tessera_db::DbManager;
use tessera_db::repository::SurrealUserRepository;
use tessera_server::config::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tessera=info".parse()?))
        .json()
        .init();

    let args = Args::parse();
    let auth_config = args.auth_config()?;

    info!("Starting Tessera server...");

    let cache = RedisCacheStore::connect(&args.cache_config())
        .await
        .context("connecting to Redis")?;
    let db = DbManager::connect(&args.db_config())
        .await
        .context("connecting to SurrealDB")?;

    let service = Arc::new(AuthService::new(
        SurrealUserRepository::new(db.client()),
        cache,
        auth_config,
    ));
    let app = tessera_server::router(service);

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!(port = args.port, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Tessera server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
