//! Pepper Server - Main Entry Point
//!
//! Admin/CMS backend for localized content and media.

use anyhow::Result;
use tracing::info;

use pepper_server::{api, config, db, media};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pepper_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Pepper Server");

    // Initialize database
    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;

    // Initialize object storage (optional - media uploads are disabled if not configured)
    let storage = match media::ObjectStorage::new(&config).await {
        Ok(client) => match client.health_check().await {
            Ok(()) => {
                info!(bucket = %config.s3_bucket, "Object storage connected");
                Some(client)
            }
            Err(e) => {
                tracing::warn!("Storage health check failed: {}. Media uploads disabled.", e);
                None
            }
        },
        Err(e) => {
            tracing::warn!(
                "Storage client initialization failed: {}. Media uploads disabled.",
                e
            );
            None
        }
    };

    // Build application state and router
    let state = api::AppState::new(db_pool, config.clone(), storage);
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
