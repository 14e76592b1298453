// Upload ingestion: validate, write the blob, then record metadata.

use std::sync::Arc;

use bytes::Bytes;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::CatalogOperations;
use crate::models::Asset;
use crate::storage::BlobStore;
use crate::types::{AppError, AppResult};

/// Two-step commit with one compensating direction: the blob write must
/// succeed before the metadata insert. A failed insert leaves an orphaned
/// blob (tolerated, logged); a metadata row without a confirmed blob is
/// never possible.
#[derive(Clone)]
pub struct UploadIngestor {
    pool: PgPool,
    store: Arc<dyn BlobStore>,
    max_size_bytes: usize,
}

impl UploadIngestor {
    pub fn new(pool: PgPool, store: Arc<dyn BlobStore>, max_size_bytes: usize) -> Self {
        Self { pool, store, max_size_bytes }
    }

    pub async fn ingest(
        &self,
        payload: Bytes,
        declared_name: &str,
        declared_content_type: &str,
    ) -> AppResult<Asset> {
        let name = declared_name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("video name is required".to_string()));
        }
        if payload.is_empty() {
            return Err(AppError::Validation("no video file uploaded".to_string()));
        }
        if payload.len() > self.max_size_bytes {
            return Err(AppError::Validation(format!(
                "file exceeds the maximum size of {} bytes",
                self.max_size_bytes
            )));
        }

        let key = generate_key(declared_content_type);

        self.store
            .put(&key, &payload, declared_content_type)
            .await?;

        let asset = CatalogOperations::insert_asset(
            &self.pool,
            name,
            &key,
            payload.len() as i64,
            declared_content_type,
        )
        .await
        .map_err(|err| {
            // The blob is written but unrecorded: an orphan. Leave it for
            // operator cleanup; never the reverse.
            warn!(key = %key, error = %err, "metadata insert failed after blob write, blob orphaned");
            err
        })?;

        info!(asset_id = %asset.id, key = %asset.key, size = asset.size, "asset ingested");
        Ok(asset)
    }
}

/// Globally unique storage key. Uniqueness comes from the uuid-v4 generation
/// strategy, not from collision checks.
fn generate_key(content_type: &str) -> String {
    let ext = mime_guess::get_mime_extensions_str(content_type)
        .and_then(|exts| exts.first())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("assets/{}{}", Uuid::new_v4(), ext)
}
