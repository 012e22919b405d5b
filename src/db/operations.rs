use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{password, CredentialError, CredentialStore, MetadataStore};
use crate::models::{CartItem, ImageRecord, NewImage};
use crate::token::Principal;

/// Postgres-backed metadata and credential store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PgStore {
    async fn insert_image(&self, image: &NewImage) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO images (id, user_id, filename, tags)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(image.id)
        .bind(image.user_id.as_str())
        .bind(&image.filename)
        .bind(&image.tags)
        .execute(&self.pool)
        .await
        .with_context(|| format!("insert image {}", image.id))?;

        Ok(())
    }

    async fn images_for_user(&self, user: &Principal) -> Result<Vec<ImageRecord>> {
        let images = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT id, user_id, filename, tags, created_at
            FROM images
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn search_images(&self, user: &Principal, query: &str) -> Result<Vec<ImageRecord>> {
        let images = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT id, user_id, filename, tags, created_at
            FROM images
            WHERE user_id = $1
              AND EXISTS (
                SELECT 1 FROM unnest(tags) AS tag
                WHERE tag ILIKE '%' || $2 || '%'
              )
            ORDER BY created_at DESC
            "#,
        )
        .bind(user.as_str())
        .bind(escape_like(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn add_to_cart(&self, user: &Principal, image_id: Uuid) -> Result<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, image_id)
            SELECT $1, id FROM images WHERE id = $2 AND user_id = $1
            ON CONFLICT (user_id, image_id) DO NOTHING
            "#,
        )
        .bind(user.as_str())
        .bind(image_id)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            return Ok(true);
        }

        // Nothing inserted: either already in the cart or not the caller's image.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM images WHERE id = $1 AND user_id = $2)")
                .bind(image_id)
                .bind(user.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn cart_for_user(&self, user: &Principal) -> Result<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT image_id, added_at
            FROM cart_items
            WHERE user_id = $1
            ORDER BY added_at ASC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn register(&self, username: &str, password: &str) -> Result<Principal, CredentialError> {
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .context("password hashing task")??;

        let user_id = Uuid::new_v4().to_string();
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&user_id)
        .bind(username)
        .bind(&hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Principal::new(user_id)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(CredentialError::UsernameTaken)
            }
            Err(e) => Err(anyhow::Error::from(e).context("insert user").into()),
        }
    }

    async fn verify(&self, username: &str, password: &str) -> Result<Option<Principal>, CredentialError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .context("look up user")?;

        let Some((user_id, hash)) = row else {
            return Ok(None);
        };

        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .context("password verification task")??;

        Ok(matches.then(|| Principal::new(user_id)))
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
