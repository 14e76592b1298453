// HTTP client for the catalog API, plus the traits the state machines
// consume so tests and alternative transports can substitute their own.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Asset, DownloadLink, PageResponse};
use crate::types::{AppError, AppResult};

/// Client-side upload ceiling, enforced before any network call. Stricter
/// than the server's ingest ceiling on purpose.
pub const CLIENT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[async_trait]
pub trait CatalogClient: Send + Sync + 'static {
    async fn fetch_page(&self, term: &str, page: u32, limit: u32) -> AppResult<PageResponse>;
}

#[async_trait]
pub trait LinkResolver: Send + Sync + 'static {
    async fn resolve(&self, asset_id: Uuid) -> AppResult<DownloadLink>;
}

/// Reject oversized files before they ever reach the wire.
pub fn check_upload_size(len: usize) -> AppResult<()> {
    if len > CLIENT_MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "max file size is {} MB",
            CLIENT_MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// The catalog endpoint answers in two shapes; normalize both to the
/// paginated envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Paged(PageResponse),
    Legacy(Vec<Asset>),
}

#[derive(Deserialize)]
struct UploadBody {
    asset: Asset,
}

pub struct HttpCatalogApi {
    client: Client,
    base_url: String,
}

impl HttpCatalogApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: Client::new(), base_url }
    }

    /// List the catalog. Omitting page/limit requests the legacy full
    /// array, which is folded into a single exhausted page.
    pub async fn list(
        &self,
        term: Option<&str>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> AppResult<PageResponse> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(term) = term.filter(|t| !t.trim().is_empty()) {
            query.push(("q", term.to_string()));
        }
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/api/catalog", self.base_url))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "catalog returned {}",
                response.status()
            )));
        }

        let body: ListBody = response.json().await?;
        Ok(match body {
            ListBody::Paged(page) => page,
            ListBody::Legacy(items) => PageResponse {
                page: 1,
                limit: items.len() as u32,
                total: items.len() as u64,
                has_more: false,
                items,
            },
        })
    }

    /// Upload a media file. The size pre-check runs before the request is
    /// even built.
    pub async fn upload(
        &self,
        name: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> AppResult<Asset> {
        check_upload_size(data.len())?;

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::Validation(format!("invalid content type: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("name", name.to_string())
            .part("video", part);

        let response = self
            .client
            .post(format!("{}/api/catalog", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "upload returned {}",
                response.status()
            )));
        }

        let body: UploadBody = response.json().await?;
        Ok(body.asset)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogApi {
    async fn fetch_page(&self, term: &str, page: u32, limit: u32) -> AppResult<PageResponse> {
        self.list(Some(term), Some(page), Some(limit)).await
    }
}

#[async_trait]
impl LinkResolver for HttpCatalogApi {
    async fn resolve(&self, asset_id: Uuid) -> AppResult<DownloadLink> {
        let response = self
            .client
            .get(format!(
                "{}/api/catalog/{}/download",
                self.base_url, asset_id
            ))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("asset {asset_id}")));
        }
        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "download link returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
