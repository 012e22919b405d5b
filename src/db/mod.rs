//! Relational storage: image metadata, carts and account credentials.
//!
//! Handlers only see the [`MetadataStore`] and [`CredentialStore`] traits;
//! [`PgStore`] is the Postgres implementation of both.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{CartItem, ImageRecord, NewImage};
use crate::token::Principal;

pub mod operations;
pub mod password;
pub mod pool;

pub use operations::PgStore;
pub use pool::{create_pool, run_migrations};

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert_image(&self, image: &NewImage) -> Result<()>;

    /// Newest first.
    async fn images_for_user(&self, user: &Principal) -> Result<Vec<ImageRecord>>;

    /// Case-insensitive substring match over the user's image tags.
    async fn search_images(&self, user: &Principal, query: &str) -> Result<Vec<ImageRecord>>;

    /// Only the caller's own images can be added. Returns `false` when
    /// `image_id` is unknown or belongs to another user, so the two cases are
    /// indistinguishable. Adding twice is a no-op.
    async fn add_to_cart(&self, user: &Principal, image_id: Uuid) -> Result<bool>;

    async fn cart_for_user(&self, user: &Principal) -> Result<Vec<CartItem>>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("username already taken")]
    UsernameTaken,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Account registration and password checks. Hands back only the principal
/// to embed in a token.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn register(&self, username: &str, password: &str) -> Result<Principal, CredentialError>;

    /// `None` for an unknown user or a wrong password.
    async fn verify(&self, username: &str, password: &str) -> Result<Option<Principal>, CredentialError>;
}
