//! HTTP handlers. Each one authenticates (where needed), makes a single
//! directory or document call, and serializes the result.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::{ApiError, AppState, SERVICE_NAME};
use crate::documents::require_data;
use crate::models::Category;
use crate::protocol::{
    DocumentResponse, HealthResponse, LoginRequest, LoginResponse, RegisterResponse,
    SaveDocumentRequest, SuccessResponse,
};
use crate::token::fingerprint;

/// Health check endpoint (no auth required)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

pub async fn register(State(state): State<AppState>) -> Result<Json<RegisterResponse>, ApiError> {
    let account = state.directory.register().await?;

    Ok(Json(RegisterResponse {
        success: true,
        token: account.token,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(body) = body?;
    let token = match body.token {
        Some(token) if !token.trim().is_empty() => token,
        _ => return Err(ApiError::Validation("Token is required".to_string())),
    };

    let account = state.directory.authenticate(&token).await?;
    tracing::info!(account = %fingerprint(&account.token), "Login");

    Ok(Json(LoginResponse {
        success: true,
        token: account.token,
        created_at: account.created_at,
    }))
}

pub async fn get_document(
    state: AppState,
    category: Category,
    token: String,
) -> Result<Json<DocumentResponse>, ApiError> {
    let account = state.directory.authenticate(&token).await?;
    let data = state.documents.get(category, &account.token).await?;

    Ok(Json(DocumentResponse {
        success: true,
        data,
    }))
}

pub async fn save_document(
    state: AppState,
    category: Category,
    token: String,
    body: Result<Json<SaveDocumentRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    // Body problems are reported before the token is checked
    let Json(body) = body?;
    let data = require_data(body.data)?;

    let account = state.directory.authenticate(&token).await?;
    state.documents.put(category, &account.token, data).await?;

    Ok(Json(SuccessResponse { success: true }))
}
