//! Persistence contract for accounts and document slots.
//!
//! Both the user directory and the document service talk to storage only
//! through [`AccountStore`] and [`DocumentStore`]. Two adapters exist:
//! [`crate::db::SqliteStore`] for real deployments and [`MemoryStore`] for
//! tests and throwaway servers.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{Account, Category, StoredDocument};

/// Errors that can occur in a storage adapter.
#[derive(Debug)]
pub enum StoreError {
    /// An account with this token already exists.
    DuplicateToken(String),
    /// A document was written for a token with no account.
    UnknownAccount(String),
    /// A stored row could not be decoded.
    Corrupt(String),
    /// Underlying database failure.
    Database(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateToken(_) => write!(f, "Token already registered"),
            StoreError::UnknownAccount(_) => write!(f, "No account for token"),
            StoreError::Corrupt(e) => write!(f, "Corrupt stored data: {}", e),
            StoreError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

/// Account persistence. Accounts are append-only.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns true if an account with this (normalized) token exists.
    async fn account_exists(&self, token: &str) -> Result<bool, StoreError>;

    /// Inserts a new account.
    ///
    /// Fails with [`StoreError::DuplicateToken`] if the token is taken. This
    /// is the authoritative uniqueness check.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn find_account(&self, token: &str) -> Result<Option<Account>, StoreError>;

    /// All accounts, oldest first.
    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;
}

/// Document slot persistence: one opaque JSON value per account per category.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns `Ok(None)` if the slot has never been written.
    async fn load_document(
        &self,
        category: Category,
        token: &str,
    ) -> Result<Option<StoredDocument>, StoreError>;

    /// Inserts or wholesale replaces the slot.
    async fn upsert_document(
        &self,
        category: Category,
        token: &str,
        data: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// A backend that provides both halves of the contract.
pub trait Store: AccountStore + DocumentStore {}

impl<T: AccountStore + DocumentStore> Store for T {}
