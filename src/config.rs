use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::token::Ttl;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub tagging: TaggingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// The single origin allowed to make credentialed cross-origin calls.
    pub cors_allowed_origin: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    pub s3_endpoint: Option<String>,
    /// Prefix for publicly reachable object URLs, e.g. a CDN host.
    pub public_base_url: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    /// Lifetime of tokens issued at register/login.
    pub token_ttl: Ttl,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"**redacted**")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaggingConfig {
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    pub directory: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_ttl = or("TOKEN_TTL", "1h");
        let auth = AuthConfig {
            secret: non_empty("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET must be set"))?,
            token_ttl: raw_ttl
                .parse::<Ttl>()
                .with_context(|| format!("TOKEN_TTL={raw_ttl:?}"))?,
        };

        Ok(Self {
            server: ServerConfig {
                port: or("PORT", "3000").parse().context("PORT")?,
                host: or("HOST", "0.0.0.0"),
                cors_allowed_origin: or("CORS_ALLOWED_ORIGIN", "http://localhost:5173"),
                max_upload_bytes: or("MAX_UPLOAD_BYTES", "10485760")
                    .parse()
                    .context("MAX_UPLOAD_BYTES")?,
            },
            database: DatabaseConfig {
                url: non_empty("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?,
                max_connections: or("DB_MAX_CONNECTIONS", "10")
                    .parse()
                    .context("DB_MAX_CONNECTIONS")?,
                min_connections: or("DB_MIN_CONNECTIONS", "1")
                    .parse()
                    .context("DB_MIN_CONNECTIONS")?,
            },
            storage: StorageConfig {
                s3_bucket: or("S3_BUCKET", "gallery-images"),
                s3_region: or("S3_REGION", "auto"),
                s3_access_key_id: non_empty("AWS_ACCESS_KEY_ID"),
                s3_secret_access_key: non_empty("AWS_SECRET_ACCESS_KEY"),
                s3_endpoint: non_empty("S3_ENDPOINT"),
                public_base_url: non_empty("PUBLIC_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string()),
            },
            auth,
            tagging: TaggingConfig {
                endpoint: non_empty("TAGGING_ENDPOINT"),
                api_token: non_empty("TAGGING_API_TOKEN"),
                timeout_secs: or("TAGGING_TIMEOUT_SECS", "15")
                    .parse()
                    .context("TAGGING_TIMEOUT_SECS")?,
            },
            logging: LoggingConfig {
                filter: or("RUST_LOG", "gallery_gate=debug,tower_http=debug"),
                directory: non_empty("LOG_DIR").map(PathBuf::from),
            },
        })
    }
}
