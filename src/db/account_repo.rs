use async_trait::async_trait;

use super::{format_timestamp, parse_timestamp, SqliteStore};
use crate::models::Account;
use crate::store::{AccountStore, StoreError};

#[derive(sqlx::FromRow)]
struct AccountRow {
    token: String,
    created_at: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            created_at: parse_timestamp(&row.created_at)?,
            token: row.token,
        })
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn account_exists(&self, token: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM accounts WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let result = sqlx::query("INSERT INTO accounts (token, created_at) VALUES (?, ?)")
            .bind(&account.token)
            .bind(format_timestamp(&account.created_at))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateToken(account.token.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_account(&self, token: &str) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> =
            sqlx::query_as("SELECT token, created_at FROM accounts WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Account::try_from).transpose()
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let rows: Vec<AccountRow> =
            sqlx::query_as("SELECT token, created_at FROM accounts ORDER BY created_at, token")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Account::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    async fn setup() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let (store, _temp) = setup().await;
        let account = Account::new("KITCH-AB23CD");

        store.insert_account(&account).await.unwrap();

        let found = store.find_account("KITCH-AB23CD").await.unwrap().unwrap();
        assert_eq!(found.token, "KITCH-AB23CD");
        assert_eq!(found.created_at, account.created_at);
    }

    #[tokio::test]
    async fn test_find_unknown_returns_none() {
        let (store, _temp) = setup().await;

        assert!(store.find_account("KITCH-ZZZZZZ").await.unwrap().is_none());
        assert!(!store.account_exists("KITCH-ZZZZZZ").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_after_insert() {
        let (store, _temp) = setup().await;
        store
            .insert_account(&Account::new("KITCH-AB23CD"))
            .await
            .unwrap();

        assert!(store.account_exists("KITCH-AB23CD").await.unwrap());
    }

    #[tokio::test]
    async fn test_primary_key_rejects_duplicate() {
        let (store, _temp) = setup().await;
        store
            .insert_account(&Account::new("KITCH-AB23CD"))
            .await
            .unwrap();

        let result = store.insert_account(&Account::new("KITCH-AB23CD")).await;

        assert!(matches!(result, Err(StoreError::DuplicateToken(_))));
    }

    #[tokio::test]
    async fn test_list_accounts_oldest_first() {
        let (store, _temp) = setup().await;
        let now = Utc::now();

        for (token, age) in [("KITCH-BBBBBB", 0), ("KITCH-CCCCCC", 2), ("KITCH-DDDDDD", 1)] {
            store
                .insert_account(&Account {
                    token: token.to_string(),
                    created_at: now - Duration::hours(age),
                })
                .await
                .unwrap();
        }

        let tokens: Vec<String> = store
            .list_accounts()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.token)
            .collect();

        assert_eq!(tokens, vec!["KITCH-CCCCCC", "KITCH-DDDDDD", "KITCH-BBBBBB"]);
    }
}
