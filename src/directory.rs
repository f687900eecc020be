//! User directory: registration and token authentication.

use std::sync::Arc;

use crate::models::Account;
use crate::store::{AccountStore, StoreError};
use crate::token::{fingerprint, generate_token, is_well_formed, normalize_token};

/// Attempts made to find an unused token before giving up.
pub const MAX_REGISTER_ATTEMPTS: usize = 10;

type TokenGenerator = dyn Fn() -> String + Send + Sync;

/// Errors from the user directory.
#[derive(Debug)]
pub enum DirectoryError {
    /// The token is malformed or no account has it.
    InvalidToken,
    /// Every generated candidate collided with an existing account.
    TokenExhausted,
    /// Storage failure.
    Store(StoreError),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::InvalidToken => write!(f, "Invalid token"),
            DirectoryError::TokenExhausted => write!(
                f,
                "Could not generate a unique token after {} attempts",
                MAX_REGISTER_ATTEMPTS
            ),
            DirectoryError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DirectoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectoryError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for DirectoryError {
    fn from(e: StoreError) -> Self {
        DirectoryError::Store(e)
    }
}

/// Maps access tokens to accounts.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn AccountStore>,
    generator: Arc<TokenGenerator>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self::with_generator(store, generate_token)
    }

    /// Uses a custom token source instead of the thread RNG.
    pub fn with_generator(
        store: Arc<dyn AccountStore>,
        generator: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            generator: Arc::new(generator),
        }
    }

    /// Creates a new account under a fresh, unused token.
    ///
    /// The existence check only avoids wasted inserts; a concurrent
    /// registration can still claim the same token first, in which case the
    /// insert fails on the primary key and the next candidate is tried.
    pub async fn register(&self) -> Result<Account, DirectoryError> {
        for attempt in 1..=MAX_REGISTER_ATTEMPTS {
            let token = (self.generator)();

            if self.store.account_exists(&token).await? {
                tracing::debug!(attempt, "Generated token already taken");
                continue;
            }

            let account = Account::new(token);
            match self.store.insert_account(&account).await {
                Ok(()) => {
                    tracing::info!(
                        account = %fingerprint(&account.token),
                        attempt,
                        "Registered account"
                    );
                    return Ok(account);
                }
                Err(StoreError::DuplicateToken(_)) => {
                    tracing::debug!(attempt, "Lost registration race for token");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(
            attempts = MAX_REGISTER_ATTEMPTS,
            "Token space exhausted during registration"
        );
        Err(DirectoryError::TokenExhausted)
    }

    /// Looks up the account for a token, ignoring case.
    pub async fn authenticate(&self, token: &str) -> Result<Account, DirectoryError> {
        let token = normalize_token(token);

        if !is_well_formed(&token) {
            return Err(DirectoryError::InvalidToken);
        }

        match self.store.find_account(&token).await? {
            Some(account) => Ok(account),
            None => {
                tracing::debug!(account = %fingerprint(&token), "Unknown token");
                Err(DirectoryError::InvalidToken)
            }
        }
    }

    /// All accounts, oldest first.
    pub async fn list(&self) -> Result<Vec<Account>, DirectoryError> {
        Ok(self.store.list_accounts().await?)
    }
}

impl std::fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn directory() -> UserDirectory {
        UserDirectory::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_register_returns_well_formed_token() {
        let account = directory().register().await.unwrap();

        assert!(is_well_formed(&account.token));
    }

    #[tokio::test]
    async fn test_register_tokens_are_unique() {
        let dir = directory();
        let mut seen = HashSet::new();

        for _ in 0..50 {
            let account = dir.register().await.unwrap();
            assert!(seen.insert(account.token));
        }
        assert_eq!(dir.list().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_register_retries_on_collision() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_account(&Account::new("KITCH-AAAAAA"))
            .await
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let dir = UserDirectory::with_generator(store, move || {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => "KITCH-AAAAAA".to_string(),
                _ => "KITCH-BBBBBB".to_string(),
            }
        });

        let account = dir.register().await.unwrap();

        assert_eq!(account.token, "KITCH-BBBBBB");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_register_exhausted_after_bounded_attempts() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_account(&Account::new("KITCH-AAAAAA"))
            .await
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let dir = UserDirectory::with_generator(store, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "KITCH-AAAAAA".to_string()
        });

        let result = dir.register().await;

        assert!(matches!(result, Err(DirectoryError::TokenExhausted)));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_REGISTER_ATTEMPTS);
    }

    /// Reports every token as free, so only the insert can detect the clash.
    struct RacingStore(MemoryStore);

    #[async_trait]
    impl AccountStore for RacingStore {
        async fn account_exists(&self, _token: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
            self.0.insert_account(account).await
        }

        async fn find_account(&self, token: &str) -> Result<Option<Account>, StoreError> {
            self.0.find_account(token).await
        }

        async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
            self.0.list_accounts().await
        }
    }

    #[tokio::test]
    async fn test_register_treats_insert_conflict_as_collision() {
        let inner = MemoryStore::new();
        inner
            .insert_account(&Account::new("KITCH-AAAAAA"))
            .await
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let dir = UserDirectory::with_generator(Arc::new(RacingStore(inner)), move || {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => "KITCH-AAAAAA".to_string(),
                _ => "KITCH-CCCCCC".to_string(),
            }
        });

        let account = dir.register().await.unwrap();

        assert_eq!(account.token, "KITCH-CCCCCC");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authenticate_is_case_insensitive() {
        let dir = directory();
        let account = dir.register().await.unwrap();

        let lower = dir
            .authenticate(&account.token.to_lowercase())
            .await
            .unwrap();
        let upper = dir.authenticate(&account.token).await.unwrap();

        assert_eq!(lower, account);
        assert_eq!(upper, account);
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let result = directory().authenticate("KITCH-AB23CD").await;

        assert!(matches!(result, Err(DirectoryError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_authenticate_malformed_token() {
        let dir = directory();

        for token in ["", "hello", "KITCH-", "KITCH-AB23CD-EXTRA"] {
            let result = dir.authenticate(token).await;
            assert!(matches!(result, Err(DirectoryError::InvalidToken)), "{}", token);
        }
    }

    #[tokio::test]
    async fn test_register_and_authenticate_with_sqlite() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let dir = UserDirectory::new(Arc::new(store));

        let account = dir.register().await.unwrap();
        let found = dir
            .authenticate(&account.token.to_lowercase())
            .await
            .unwrap();

        assert_eq!(found.token, account.token);
        assert_eq!(found.created_at, account.created_at);
    }
}
