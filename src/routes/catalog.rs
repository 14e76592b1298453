use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::db::CatalogOperations;
use crate::models::{AppState, CatalogQuery, CatalogResponse, DownloadLink, UploadResponse};
use crate::types::{AppError, AppResult};

// Slack on top of the ingest ceiling for the other multipart fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_size_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/api/catalog", get(list_catalog).post(upload_asset))
        .route("/api/catalog/{id}/download", get(download_link))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Catalog listing with optional tokenized search and pagination. When both
/// `page` and `limit` are present the response is the paginated envelope;
/// otherwise the legacy full array, newest first.
async fn list_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> AppResult<Json<CatalogResponse>> {
    let term = params.q.as_deref().unwrap_or("");

    let response = match (params.page, params.limit) {
        (Some(page), Some(limit)) => {
            let page = CatalogOperations::query_page(&state.pool, term, page, limit).await?;
            CatalogResponse::Paged(page)
        }
        _ => {
            let items = CatalogOperations::list_all(&state.pool, term).await?;
            CatalogResponse::Legacy(items)
        }
    };

    Ok(Json(response))
}

async fn download_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DownloadLink>> {
    let link = state.issuer.issue_download(id).await?;
    Ok(Json(link))
}

/// Multipart upload: a `name` text field plus a binary `video` part.
async fn upload_asset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let mut name: Option<String> = None;
    let mut file: Option<(Bytes, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("name") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable name field: {e}")))?;
                name = Some(value);
            }
            Some("video") => {
                let content_type = field
                    .content_type()
                    .map(str::to_owned)
                    .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable video field: {e}")))?;
                file = Some((data, content_type));
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| AppError::Validation("video name is required".to_string()))?;
    let (data, content_type) =
        file.ok_or_else(|| AppError::Validation("no video file uploaded".to_string()))?;

    info!(name = %name, size = data.len(), content_type = %content_type, "upload received");

    let asset = state.ingestor.ingest(data, &name, &content_type).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Video uploaded successfully".to_string(),
            asset,
        }),
    ))
}
