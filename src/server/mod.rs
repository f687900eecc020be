//! HTTP API for the pantry service.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check (no auth)
//! - `POST /api/pantry/register`: Create an account, returns its token
//! - `POST /api/pantry/login`: Validate a token, returns its creation time
//! - `GET|POST /api/pantry/{category}/{token}`: Read or replace a document,
//!   where category is `ingredients`, `recipes`, `shopping` or `mealplan`

pub mod config;
mod error;
mod handlers;

pub use config::{ConfigError, ServerConfig, StorageBackend};
pub use error::ApiError;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::directory::UserDirectory;
use crate::documents::Documents;
use crate::models::Category;
use crate::protocol::SaveDocumentRequest;
use crate::store::Store;

/// Reported by the health endpoint.
pub const SERVICE_NAME: &str = "pantry-api";

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub directory: UserDirectory,
    pub documents: Documents,
}

impl AppState {
    pub fn new<S: Store + 'static>(store: Arc<S>, max_document_bytes: usize) -> Self {
        Self {
            directory: UserDirectory::new(store.clone()),
            documents: Documents::new(store, max_document_bytes),
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let mut api = Router::new()
        .route("/api/pantry/register", post(handlers::register))
        .route("/api/pantry/login", post(handlers::login));

    for category in Category::ALL {
        let path = format!("/api/pantry/{}/{{token}}", category.route());
        api = api.route(
            &path,
            get(
                move |State(state): State<AppState>, Path(token): Path<String>| async move {
                    handlers::get_document(state, category, token).await
                },
            )
            .post(
                move |State(state): State<AppState>,
                      Path(token): Path<String>,
                      body: Result<Json<SaveDocumentRequest>, JsonRejection>| async move {
                    handlers::save_document(state, category, token, body).await
                },
            ),
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
