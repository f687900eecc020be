//! Helpers shared by tests that need a live server.

use std::sync::Arc;

use crate::documents::DEFAULT_MAX_DOCUMENT_BYTES;
use crate::server::{config::DEFAULT_MAX_BODY_BYTES, router, AppState};
use crate::store::MemoryStore;

/// Serves a fresh in-memory API on an ephemeral port and returns its base URL.
pub async fn spawn_server() -> String {
    let state = AppState::new(Arc::new(MemoryStore::new()), DEFAULT_MAX_DOCUMENT_BYTES);
    let app = router(state, DEFAULT_MAX_BODY_BYTES);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
