//! Pantry API Server
//!
//! Serves token-addressed kitchen documents over HTTP.
//!
//! # Configuration
//!
//! See [`pantry::server::config`] for the environment variables and the
//! config file format. `RUST_LOG` controls log verbosity.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pantry::server::{router, shutdown_signal, AppState, ServerConfig, StorageBackend};
use pantry::{MemoryStore, SqliteStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pantry=info,pantry_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::load(None) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let state = match config.storage {
        StorageBackend::Sqlite => {
            tracing::info!("Database: {}", config.database_path.display());
            match SqliteStore::open(&config.database_path).await {
                Ok(store) => AppState::new(Arc::new(store), config.max_document_bytes),
                Err(e) => {
                    tracing::error!("Failed to open database: {}", e);
                    std::process::exit(1);
                }
            }
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            AppState::new(Arc::new(MemoryStore::new()), config.max_document_bytes)
        }
    };

    let app = router(state, config.max_body_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Starting server on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
