//! In-process storage adapter.
//!
//! Thread-safe via internal RwLocks. Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{AccountStore, DocumentStore, StoreError};
use crate::models::{Account, Category, StoredDocument};

#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Accounts indexed by token.
    accounts: RwLock<HashMap<String, Account>>,
    documents: RwLock<HashMap<(Category, String), StoredDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn account_exists(&self, token: &str) -> Result<bool, StoreError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(accounts.contains_key(token))
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if accounts.contains_key(&account.token) {
            return Err(StoreError::DuplicateToken(account.token.clone()));
        }
        accounts.insert(account.token.clone(), account.clone());
        Ok(())
    }

    async fn find_account(&self, token: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(accounts.get(token).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        let mut list: Vec<Account> = accounts.values().cloned().collect();
        list.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.token.cmp(&b.token))
        });
        Ok(list)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load_document(
        &self,
        category: Category,
        token: &str,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(documents.get(&(category, token.to_string())).cloned())
    }

    async fn upsert_document(
        &self,
        category: Category,
        token: &str,
        data: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // Mirrors the foreign key on the SQL tables
        if !self.account_exists(token).await? {
            return Err(StoreError::UnknownAccount(token.to_string()));
        }

        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        documents.insert(
            (category, token.to_string()),
            StoredDocument {
                data: data.clone(),
                updated_at,
            },
        );
        Ok(())
    }
}
