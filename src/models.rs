use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::db::{CredentialStore, MetadataStore};
use crate::middleware::AuthGate;
use crate::storage::ObjectStore;
use crate::tagging::Tagger;
use crate::token::{Principal, TokenCodec};

/// Everything a request handler may touch. Read-only once built.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenCodec>,
    pub gate: AuthGate,
    pub objects: Arc<dyn ObjectStore>,
    pub metadata: Arc<dyn MetadataStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub tagger: Arc<dyn Tagger>,
}

impl AppState {
    /// Wires the gate to the same codec that issues tokens.
    pub fn new(
        config: Config,
        tokens: TokenCodec,
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        credentials: Arc<dyn CredentialStore>,
        tagger: Arc<dyn Tagger>,
    ) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            config: Arc::new(config),
            gate: AuthGate::new(tokens.clone()),
            tokens,
            objects,
            metadata,
            credentials,
            tagger,
        }
    }
}

// Rows
// Note: FromRow is needed for runtime query_as (no DATABASE_URL at compile time)

#[derive(Debug, Clone)]
pub struct NewImage {
    pub id: Uuid,
    pub user_id: Principal,
    pub filename: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImageRecord {
    pub id: Uuid,
    pub user_id: String,
    pub filename: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub image_id: Uuid,
    pub added_at: DateTime<Utc>,
}

// API Request/Response types

#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 3, max = 64, message = "username must be 3-64 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub success: bool,
    pub user_id: Principal,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub image_id: Uuid,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub id: Uuid,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagesResponse {
    pub success: bool,
    pub images: Vec<ImageSummary>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub image_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartResponse {
    pub success: bool,
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
}
