//! Bearer-token authorization gate
//!
//! The gate reads `Authorization: Bearer <token>`, hands the token to a
//! [`TokenVerifier`], and resolves the principal from the verified claims.
//! Every failure reason is logged but collapses to a single unauthenticated
//! outcome for the client.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::models::AppState;
use crate::token::{Principal, TokenError, TokenVerifier};
use crate::types::AppError;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    #[error("no bearer credential")]
    MissingCredential,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("verified token carries no principal")]
    MissingPrincipal,
}

/// Per-request authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResult {
    pub is_authenticated: bool,
    pub user_id: Option<Principal>,
}

impl AuthorizationResult {
    pub fn authenticated(user_id: Principal) -> Self {
        Self {
            is_authenticated: true,
            user_id: Some(user_id),
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            is_authenticated: false,
            user_id: None,
        }
    }
}

/// Token from a `Bearer` authorization header, if there is a usable one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthGate {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Resolve the principal, keeping the precise rejection reason.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthRejection> {
        let token = bearer_token(headers).ok_or(AuthRejection::MissingCredential)?;
        let claims = self.verifier.verify(token)?;
        claims.principal().ok_or(AuthRejection::MissingPrincipal)
    }

    pub fn authorize(&self, headers: &HeaderMap) -> AuthorizationResult {
        match self.authenticate(headers) {
            Ok(principal) => AuthorizationResult::authenticated(principal),
            Err(reason) => {
                debug!(%reason, "Request not authenticated");
                AuthorizationResult::unauthenticated()
            }
        }
    }
}

/// Route layer for protected endpoints. On success the principal is placed
/// in request extensions; on failure the inner handler never runs.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match state.gate.authorize(req.headers()) {
        AuthorizationResult {
            is_authenticated: true,
            user_id: Some(principal),
        } => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        _ => AppError::Unauthorized.into_response(),
    }
}
