//! HTTP client for the pantry API.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::Category;
use crate::protocol::{
    DocumentResponse, ErrorResponse, HealthResponse, LoginRequest, LoginResponse,
    RegisterResponse, SaveDocumentRequest, SuccessResponse,
};

/// Errors that can occur when talking to the API.
#[derive(Debug)]
pub enum ClientError {
    /// Transport failure or undecodable response.
    Http(reqwest::Error),
    /// The server answered with a failure status.
    Api { status: u16, message: String },
}

impl ClientError {
    /// True if the server rejected the token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Api { status, message } => {
                write!(f, "Server returned {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(e) => Some(e),
            ClientError::Api { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

/// Thin typed wrapper over the HTTP API. Holds no session state.
#[derive(Debug, Clone)]
pub struct PantryClient {
    base_url: String,
    http: reqwest::Client,
}

impl PantryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        decode(response).await
    }

    /// Creates an account and returns its token.
    pub async fn register(&self) -> Result<String, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/pantry/register", self.base_url))
            .send()
            .await?;
        let body: RegisterResponse = decode(response).await?;
        Ok(body.token)
    }

    pub async fn login(&self, token: &str) -> Result<LoginResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/pantry/login", self.base_url))
            .json(&LoginRequest {
                token: Some(token.to_string()),
            })
            .send()
            .await?;
        decode(response).await
    }

    pub async fn get_document(&self, category: Category, token: &str) -> Result<Value, ClientError> {
        let response = self
            .http
            .get(self.document_url(category, token))
            .send()
            .await?;
        let body: DocumentResponse = decode(response).await?;
        Ok(body.data)
    }

    pub async fn put_document(
        &self,
        category: Category,
        token: &str,
        data: &Value,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.document_url(category, token))
            .json(&SaveDocumentRequest {
                data: Some(data.clone()),
            })
            .send()
            .await?;
        let _: SuccessResponse = decode(response).await?;
        Ok(())
    }

    fn document_url(&self, category: Category, token: &str) -> String {
        format!(
            "{}/api/pantry/{}/{}",
            self.base_url,
            category.route(),
            urlencoding::encode(token)
        )
    }
}

/// Decodes a success body, or turns a failure status into [`ClientError::Api`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await?;
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                text
            }
        });

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
