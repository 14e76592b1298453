// Storage layer (S3-compatible)

use async_trait::async_trait;

use crate::types::AppResult;

pub mod s3_client;
pub mod signer;

pub use s3_client::S3Store;
pub use signer::SignedUrlIssuer;

/// Durable blob storage: write a payload under a key, or mint a time-bound
/// capability URL for an existing key. TTLs are hints passed through to the
/// backing store, not enforced here.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Write `data` under `key`. Returns only once the store has confirmed
    /// the write; callers rely on that for commit ordering.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<()>;

    /// Mint a read URL for `key`, valid for `expiry_secs` from now.
    async fn presign_get(&self, key: &str, expiry_secs: u32) -> AppResult<String>;

    /// Mint a write URL for `key`, valid for `expiry_secs` from now.
    async fn presign_put(&self, key: &str, expiry_secs: u32) -> AppResult<String>;
}
