// Image classification over HTTP (Cloudflare Workers AI REST API shape).
//
// POST <endpoint> with the raw image as the body and a bearer API token.
// Labels are read from `result[].label` (REST API) or `labels[].name`
// (Workers binding shape).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use std::time::Duration;

use super::{ImageInput, Tagger};
use crate::config::TaggingConfig;

pub const DEFAULT_MODEL: &str = "@cf/microsoft/resnet-50";

pub struct WorkersAiTagger {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Label {
    #[serde(alias = "name")]
    label: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    success: Option<bool>,
    result: Option<Vec<Label>>,
    labels: Option<Vec<Label>>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

impl WorkersAiTagger {
    pub fn new(endpoint: impl Into<String>, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build tagging HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token,
        })
    }

    /// `None` when no endpoint is configured.
    pub fn from_config(config: &TaggingConfig) -> Result<Option<Self>> {
        config
            .endpoint
            .as_ref()
            .map(|endpoint| {
                Self::new(
                    endpoint.clone(),
                    config.api_token.clone(),
                    Duration::from_secs(config.timeout_secs),
                )
            })
            .transpose()
    }
}

#[async_trait]
impl Tagger for WorkersAiTagger {
    async fn classify(&self, image: &ImageInput) -> Result<Vec<String>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, image.mime_type.as_ref())
            .body(image.bytes.clone());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response: RunResponse = request
            .send()
            .await
            .context("tagging request failed")?
            .error_for_status()
            .context("tagging service returned an error status")?
            .json()
            .await
            .context("tagging response was not valid JSON")?;

        if response.success == Some(false) {
            bail!("tagging service reported failure: {:?}", response.errors);
        }

        match response.result.or(response.labels) {
            Some(labels) => Ok(labels.into_iter().map(|l| l.label).collect()),
            None => bail!("tagging response carried no labels"),
        }
    }
}
