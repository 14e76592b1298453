use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    /// Lifetime of minted download/preview URLs, in seconds.
    pub url_ttl_secs: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Ingest ceiling; larger payloads are rejected before any storage call.
    pub max_size_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub api_key: Option<String>,
    pub from_email: Option<String>,
    pub to_email: Option<String>,
    pub api_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .expect("DATABASE_URL must be set"),
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()?,
            },
            storage: StorageConfig {
                bucket: env::var("S3_BUCKET").unwrap_or_default(),
                region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
                endpoint: env::var("S3_ENDPOINT").ok(),
                url_ttl_secs: env::var("URL_TTL_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()?,
            },
            upload: UploadConfig {
                max_size_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| (100 * 1024 * 1024).to_string())
                    .parse()?,
            },
            notify: NotifyConfig {
                api_key: env::var("RESEND_API_KEY").ok(),
                from_email: env::var("RESEND_FROM_EMAIL").ok(),
                to_email: env::var("RESEND_TO_EMAIL").ok(),
                api_base: env::var("RESEND_API_BASE")
                    .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            },
        })
    }
}
