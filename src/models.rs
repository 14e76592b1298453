use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::ingest::UploadIngestor;
use crate::storage::{BlobStore, SignedUrlIssuer};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub store: Arc<dyn BlobStore>,
    pub issuer: SignedUrlIssuer,
    pub ingestor: UploadIngestor,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, store: Arc<dyn BlobStore>) -> Self {
        let issuer = SignedUrlIssuer::new(
            pool.clone(),
            store.clone(),
            config.storage.url_ttl_secs,
        );
        let ingestor = UploadIngestor::new(
            pool.clone(),
            store.clone(),
            config.upload.max_size_bytes,
        );
        Self { pool, config, store, issuer, ingestor }
    }
}

// Core models
// Note: FromRow is needed for runtime query_as (without DATABASE_URL at compile time)

/// One cataloged media item. The storage key is write-once and never reused;
/// a row must never exist without a successfully written blob behind it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: uuid::Uuid,
    pub name: String,
    pub key: String,
    pub size: i64,
    pub media_type: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Insertion sequence, used only to break created_at ties deterministically.
    #[serde(skip)]
    pub seq: i64,
}

/// One bounded slice of the catalog plus enough bookkeeping for the client
/// to know whether another page exists.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub items: Vec<Asset>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

/// The catalog listing comes in two shapes: the paginated envelope when
/// page/limit are supplied, and the legacy full array when they are not.
/// The dual contract is intentional and preserved.
#[derive(Debug, serde::Serialize)]
#[serde(untagged)]
pub enum CatalogResponse {
    Paged(PageResponse),
    Legacy(Vec<Asset>),
}

/// Time-bound capability to read one storage key. Never persisted; minted
/// fresh per request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub url: String,
    pub filename: String,
    pub media_type: String,
}

// API Request/Response types

#[derive(Debug, Default, serde::Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, serde::Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub asset: Asset,
}

#[derive(Debug, serde::Deserialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssetRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    pub asset_name: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: String,
}
