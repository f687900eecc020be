use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{format_timestamp, parse_timestamp, SqliteStore};
use crate::models::{Category, StoredDocument};
use crate::store::{DocumentStore, StoreError};

#[derive(sqlx::FromRow)]
struct DocumentRow {
    data: String,
    updated_at: String,
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn load_document(
        &self,
        category: Category,
        token: &str,
    ) -> Result<Option<StoredDocument>, StoreError> {
        // Table names come from a closed enum, never from user input
        let sql = format!(
            "SELECT data, updated_at FROM {} WHERE token = ?",
            category.table()
        );

        let row: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data = serde_json::from_str(&row.data)
            .map_err(|e| StoreError::Corrupt(format!("{} document: {}", category, e)))?;

        Ok(Some(StoredDocument {
            data,
            updated_at: parse_timestamp(&row.updated_at)?,
        }))
    }

    async fn upsert_document(
        &self,
        category: Category,
        token: &str,
        data: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {} (token, data, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(token) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
            category.table()
        );

        let result = sqlx::query(&sql)
            .bind(token)
            .bind(data.to_string())
            .bind(format_timestamp(&updated_at))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(StoreError::UnknownAccount(token.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
