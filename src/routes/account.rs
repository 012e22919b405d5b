//! Registration and login
//!
//! Password handling belongs to the [`CredentialStore`](crate::db::CredentialStore);
//! these handlers only turn the principal it returns into a signed token.

use axum::{extract::State, Json};
use tracing::info;
use validator::Validate;

use crate::db::CredentialError;
use crate::models::{AppState, CredentialsRequest, TokenResponse};
use crate::token::{Claims, Principal};
use crate::types::{AppError, AppResult};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> AppResult<Json<TokenResponse>> {
    request
        .validate()
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?;

    let principal = state
        .credentials
        .register(&request.username, &request.password)
        .await
        .map_err(|e| match e {
            CredentialError::UsernameTaken => AppError::Conflict("Username already exists".to_string()),
            CredentialError::Other(e) => AppError::Internal(format!("register: {e:#}")),
        })?;

    info!(user_id = %principal, "Registered new account");
    token_response(&state, principal, &request.username)
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> AppResult<Json<TokenResponse>> {
    let principal = state
        .credentials
        .verify(&request.username, &request.password)
        .await
        .map_err(|e| AppError::Internal(format!("login: {e:#}")))?
        .ok_or(AppError::Unauthorized)?;

    info!(user_id = %principal, "Login succeeded");
    token_response(&state, principal, &request.username)
}

fn token_response(state: &AppState, principal: Principal, username: &str) -> AppResult<Json<TokenResponse>> {
    let claims = Claims::for_principal(&principal).with("username", username);
    let token = state
        .tokens
        .issue_for(&claims, state.config.auth.token_ttl)
        .map_err(|e| AppError::Internal(format!("issue token: {e}")))?;

    Ok(Json(TokenResponse {
        success: true,
        user_id: principal,
        token,
    }))
}
