//! Per-account document slots.
//!
//! Each category holds one opaque JSON value per account. Reads of a slot
//! that was never written return the category default; writes replace the
//! whole value. Callers must authenticate the token first.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::models::Category;
use crate::store::{DocumentStore, StoreError};
use crate::token::fingerprint;

/// Default ceiling for a single serialized document.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// Errors from the document service.
#[derive(Debug)]
pub enum DocumentError {
    /// The `data` field was absent or null.
    MissingData,
    /// The serialized document exceeds the configured ceiling.
    TooLarge { size: usize, limit: usize },
    /// Storage failure.
    Store(StoreError),
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::MissingData => write!(f, "Data is required"),
            DocumentError::TooLarge { size, limit } => write!(
                f,
                "Document is {} bytes, limit is {} bytes",
                size, limit
            ),
            DocumentError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for DocumentError {
    fn from(e: StoreError) -> Self {
        DocumentError::Store(e)
    }
}

/// Rejects a missing or null payload.
pub fn require_data(data: Option<Value>) -> Result<Value, DocumentError> {
    match data {
        None | Some(Value::Null) => Err(DocumentError::MissingData),
        Some(value) => Ok(value),
    }
}

#[derive(Clone)]
pub struct Documents {
    store: Arc<dyn DocumentStore>,
    max_document_bytes: usize,
}

impl Documents {
    pub fn new(store: Arc<dyn DocumentStore>, max_document_bytes: usize) -> Self {
        Self {
            store,
            max_document_bytes,
        }
    }

    /// Returns the stored document, or the category default if none exists.
    pub async fn get(&self, category: Category, token: &str) -> Result<Value, DocumentError> {
        let doc = self.store.load_document(category, token).await?;
        Ok(doc
            .map(|d| d.data)
            .unwrap_or_else(|| category.default_document()))
    }

    /// Replaces the document. Last write wins.
    pub async fn put(
        &self,
        category: Category,
        token: &str,
        data: Value,
    ) -> Result<(), DocumentError> {
        let data = require_data(Some(data))?;

        let size = data.to_string().len();
        if size > self.max_document_bytes {
            return Err(DocumentError::TooLarge {
                size,
                limit: self.max_document_bytes,
            });
        }

        self.store
            .upsert_document(category, token, &data, Utc::now())
            .await?;

        tracing::info!(
            account = %fingerprint(token),
            %category,
            bytes = size,
            "Saved document"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Documents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Documents")
            .field("max_document_bytes", &self.max_document_bytes)
            .finish_non_exhaustive()
    }
}
