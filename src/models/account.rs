use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. The token is both identifier and credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            created_at: Utc::now(),
        }
    }
}
