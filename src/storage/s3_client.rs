use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use crate::config::StorageConfig;
use crate::storage::BlobStore;
use crate::types::{AppError, AppResult};

/// S3-backed blob store. Works against AWS or any S3-compatible endpoint
/// (MinIO etc. via `S3_ENDPOINT`, which switches to path-style addressing).
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    pub fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|_| AppError::Storage(format!("invalid S3 region: {}", config.region)))?,
        };

        let credentials = Credentials::new(
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("S3 credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| AppError::Storage(format!("S3 bucket handle: {e}")))?;
        if config.endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket: Box::new(bucket) })
    }
}

#[async_trait]
impl BlobStore for S3Store {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<()> {
        debug!(key, size = data.len(), "writing blob");

        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("put {key}: {e}")))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(AppError::Storage(format!(
                "put {key}: unexpected status {status}"
            )));
        }

        Ok(())
    }

    async fn presign_get(&self, key: &str, expiry_secs: u32) -> AppResult<String> {
        self.bucket
            .presign_get(key, expiry_secs, None)
            .await
            .map_err(|e| AppError::Storage(format!("presign get {key}: {e}")))
    }

    async fn presign_put(&self, key: &str, expiry_secs: u32) -> AppResult<String> {
        self.bucket
            .presign_put(key, expiry_secs, None)
            .await
            .map_err(|e| AppError::Storage(format!("presign put {key}: {e}")))
    }
}
