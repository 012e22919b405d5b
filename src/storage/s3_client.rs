// S3 client backed by rust-s3. Works against AWS S3 and S3-compatible
// endpoints such as Cloudflare R2 or MinIO (path-style addressing).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use s3::{creds::Credentials, region::Region, Bucket};
use tracing::{debug, info};

use super::ObjectStore;
use crate::config::StorageConfig;

pub struct S3ObjectStore {
    bucket: Bucket,
    public_base_url: Option<String>,
}

impl S3ObjectStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let region = match &config.s3_endpoint {
            Some(endpoint) => Region::Custom {
                region: config.s3_region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .s3_region
                .parse()
                .with_context(|| format!("invalid S3 region {:?}", config.s3_region))?,
        };

        let credentials = Credentials::new(
            config.s3_access_key_id.as_deref(),
            config.s3_secret_access_key.as_deref(),
            None,
            None,
            None,
        )
        .context("failed to resolve S3 credentials")?;

        let bucket = Bucket::new(&config.s3_bucket, region, credentials)
            .context("failed to configure S3 bucket")?
            .with_path_style();

        info!("Object store configured for bucket {}", config.s3_bucket);
        Ok(Self {
            bucket,
            public_base_url: config.public_base_url.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &bytes, content_type)
            .await
            .with_context(|| format!("put {key}"))?;

        if !(200..300).contains(&response.status_code()) {
            bail!("put {key}: storage returned status {}", response.status_code());
        }
        debug!("Stored object {} ({} bytes)", key, bytes.len());
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .with_context(|| format!("delete {key}"))?;

        if !(200..300).contains(&response.status_code()) {
            bail!("delete {key}: storage returned status {}", response.status_code());
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> Option<String> {
        self.public_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base, key))
    }
}
