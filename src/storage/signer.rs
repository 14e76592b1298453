use std::sync::Arc;

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::db::CatalogOperations;
use crate::models::DownloadLink;
use crate::storage::BlobStore;
use crate::types::{AppError, AppResult};

/// Mints time-bound capability URLs for cataloged assets without exposing
/// storage credentials. Stateless and idempotent: every call yields a fresh,
/// independently expiring URL.
#[derive(Clone)]
pub struct SignedUrlIssuer {
    pool: PgPool,
    store: Arc<dyn BlobStore>,
    default_ttl_secs: u32,
}

impl SignedUrlIssuer {
    pub fn new(pool: PgPool, store: Arc<dyn BlobStore>, default_ttl_secs: u32) -> Self {
        Self { pool, store, default_ttl_secs }
    }

    /// Resolve an asset id to a download link with the default TTL.
    pub async fn issue_download(&self, asset_id: Uuid) -> AppResult<DownloadLink> {
        self.issue_download_with_ttl(asset_id, self.default_ttl_secs).await
    }

    /// Same as [`issue_download`](Self::issue_download) with an explicit TTL.
    /// The TTL is a hint forwarded to the store, not enforced here.
    pub async fn issue_download_with_ttl(
        &self,
        asset_id: Uuid,
        ttl_secs: u32,
    ) -> AppResult<DownloadLink> {
        let asset = CatalogOperations::get_asset(&self.pool, asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("asset {asset_id}")))?;

        let url = self.store.presign_get(&asset.key, ttl_secs).await?;
        debug!(asset_id = %asset_id, key = %asset.key, ttl_secs, "issued download url");

        Ok(DownloadLink {
            url,
            filename: asset.name,
            media_type: asset.media_type,
        })
    }

    /// Mint a write capability for a not-yet-ingested key. The declared
    /// content type is advisory; the store does not bind it to the URL.
    pub async fn issue_upload_target(
        &self,
        key: &str,
        content_type: &str,
    ) -> AppResult<String> {
        debug!(key, content_type, ttl_secs = self.default_ttl_secs, "issuing upload target");
        self.store.presign_put(key, self.default_ttl_secs).await
    }
}
