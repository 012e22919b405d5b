//! Image tagging
//!
//! Tags are advisory. [`tag_or_empty`] is the only entry point handlers use:
//! any classifier failure is logged and becomes an empty tag list so the
//! upload carries on.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

pub mod workers_ai;

pub use workers_ai::WorkersAiTagger;

/// Raw image bytes and their declared type, built by the caller.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Bytes,
    pub mime_type: mime::Mime,
}

impl ImageInput {
    pub fn new(bytes: impl Into<Bytes>, mime_type: mime::Mime) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type,
        }
    }
}

#[async_trait]
pub trait Tagger: Send + Sync {
    async fn classify(&self, image: &ImageInput) -> Result<Vec<String>>;
}

/// Used when no classifier endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTagger;

#[async_trait]
impl Tagger for DisabledTagger {
    async fn classify(&self, _image: &ImageInput) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

pub async fn tag_or_empty(tagger: &dyn Tagger, image: &ImageInput) -> Vec<String> {
    match tagger.classify(image).await {
        Ok(tags) => {
            debug!("Tagged image with {} labels", tags.len());
            tags
        }
        Err(e) => {
            warn!("Image tagging failed, continuing without tags: {:#}", e);
            Vec::new()
        }
    }
}
