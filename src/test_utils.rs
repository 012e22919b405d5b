//! In-memory collaborators and state builders for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{CredentialError, CredentialStore, MetadataStore};
use crate::models::{AppState, CartItem, ImageRecord, NewImage};
use crate::storage::ObjectStore;
use crate::tagging::{ImageInput, Tagger};
use crate::token::{ManualClock, Principal, SecretKey, TokenCodec};

pub const TEST_SECRET: &str = "test-secret-key-for-tokens";
pub const TEST_ORIGIN: &str = "https://images.example.com";

#[derive(Default)]
pub struct MemoryObjectStore {
    pub objects: Mutex<HashMap<String, (Bytes, String)>>,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_puts: AtomicBool,
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            bail!("bucket unavailable");
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> Option<String> {
        Some(format!("https://cdn.example.com/{key}"))
    }
}

#[derive(Default)]
pub struct MemoryMetadataStore {
    pub images: Mutex<Vec<ImageRecord>>,
    pub carts: Mutex<Vec<(String, CartItem)>>,
    pub calls: AtomicUsize,
    pub fail_inserts: AtomicBool,
}

impl MemoryMetadataStore {
    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn seed(&self, user: &str, filename: &str, tags: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        self.images.lock().unwrap().push(ImageRecord {
            id,
            user_id: user.to_string(),
            filename: filename.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
        });
        id
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert_image(&self, image: &NewImage) -> Result<()> {
        self.touch();
        if self.fail_inserts.load(Ordering::SeqCst) {
            bail!("connection reset");
        }
        self.images.lock().unwrap().push(ImageRecord {
            id: image.id,
            user_id: image.user_id.to_string(),
            filename: image.filename.clone(),
            tags: image.tags.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn images_for_user(&self, user: &Principal) -> Result<Vec<ImageRecord>> {
        self.touch();
        let mut images: Vec<_> = self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == user.as_str())
            .cloned()
            .collect();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images)
    }

    async fn search_images(&self, user: &Principal, query: &str) -> Result<Vec<ImageRecord>> {
        let needle = query.to_lowercase();
        Ok(self
            .images_for_user(user)
            .await?
            .into_iter()
            .filter(|i| i.tags.iter().any(|t| t.to_lowercase().contains(&needle)))
            .collect())
    }

    async fn add_to_cart(&self, user: &Principal, image_id: Uuid) -> Result<bool> {
        self.touch();
        if !self
            .images
            .lock()
            .unwrap()
            .iter()
            .any(|i| i.id == image_id && i.user_id == user.as_str())
        {
            return Ok(false);
        }
        let mut carts = self.carts.lock().unwrap();
        if !carts
            .iter()
            .any(|(owner, item)| owner == user.as_str() && item.image_id == image_id)
        {
            carts.push((
                user.to_string(),
                CartItem {
                    image_id,
                    added_at: Utc::now(),
                },
            ));
        }
        Ok(true)
    }

    async fn cart_for_user(&self, user: &Principal) -> Result<Vec<CartItem>> {
        self.touch();
        Ok(self
            .carts
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| owner == user.as_str())
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Plain-text passwords; test use only.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<String, (Principal, String)>>,
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn register(&self, username: &str, password: &str) -> Result<Principal, CredentialError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(username) {
            return Err(CredentialError::UsernameTaken);
        }
        let principal = Principal::new(Uuid::new_v4().to_string());
        users.insert(username.to_string(), (principal.clone(), password.to_string()));
        Ok(principal)
    }

    async fn verify(&self, username: &str, password: &str) -> Result<Option<Principal>, CredentialError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(username)
            .filter(|(_, stored)| stored == password)
            .map(|(principal, _)| principal.clone()))
    }
}

#[derive(Default)]
pub struct StubTagger {
    pub tags: Vec<String>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubTagger {
    pub fn returning(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Tagger for StubTagger {
    async fn classify(&self, _image: &ImageInput) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("model timed out");
        }
        Ok(self.tags.clone())
    }
}

pub fn test_config() -> Config {
    let vars: HashMap<String, String> = [
        ("JWT_SECRET", TEST_SECRET),
        ("DATABASE_URL", "postgres://localhost/gallery_test"),
        ("CORS_ALLOWED_ORIGIN", TEST_ORIGIN),
        ("TOKEN_TTL", "1h"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    Config::from_map(&vars).unwrap()
}

/// Handles on every collaborator behind a test [`AppState`].
pub struct TestHarness {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub objects: Arc<MemoryObjectStore>,
    pub metadata: Arc<MemoryMetadataStore>,
    pub tagger: Arc<StubTagger>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_tagger(StubTagger::returning(&["cat", "Sofa"]))
    }

    pub fn with_tagger(tagger: StubTagger) -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let objects = Arc::new(MemoryObjectStore::default());
        let metadata = Arc::new(MemoryMetadataStore::default());
        let tagger = Arc::new(tagger);
        let codec = TokenCodec::with_clock(SecretKey::new(TEST_SECRET).unwrap(), clock.clone());

        let state = AppState::new(
            test_config(),
            codec,
            objects.clone(),
            metadata.clone(),
            Arc::new(MemoryCredentialStore::default()),
            tagger.clone(),
        );

        Self {
            state,
            clock,
            objects,
            metadata,
            tagger,
        }
    }

    /// Bearer token for `user` valid for an hour.
    pub fn token_for(&self, user: &str) -> String {
        self.state
            .tokens
            .issue(&crate::token::Claims::new().with("userId", user), "1h")
            .unwrap()
    }
}
