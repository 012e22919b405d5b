// Object storage for uploaded image bytes (S3-compatible)

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::token::Principal;

pub mod s3_client;

pub use s3_client::S3ObjectStore;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`; returns the key the object was stored at.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String>;

    async fn delete(&self, key: &str) -> Result<()>;

    fn public_url(&self, key: &str) -> Option<String>;
}

/// `<owner>/<image id>.<ext>`, extension derived from the MIME type.
pub fn object_key(owner: &Principal, image_id: Uuid, mime_type: &mime::Mime) -> String {
    let extension = if mime_type.type_() == mime::IMAGE && mime_type.subtype() == mime::JPEG {
        Some("jpg")
    } else {
        mime_guess::get_mime_extensions(mime_type).and_then(|exts| exts.first().copied())
    };
    match extension {
        Some(ext) => format!("{}/{}.{}", owner, image_id, ext),
        None => format!("{}/{}", owner, image_id),
    }
}
