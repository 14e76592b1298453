use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Asset, PageResponse};
use crate::types::AppResult;

/// Hard cap on page size; requested limits are clamped into [1, MAX_PAGE_LIMIT].
pub const MAX_PAGE_LIMIT: u32 = 100;

const ASSET_COLUMNS: &str = "id, name, key, size, media_type, created_at, seq";

/// Floor the requested page to 1.
pub fn clamp_page(page: u32) -> u32 {
    page.max(1)
}

/// Clamp the requested limit into [1, MAX_PAGE_LIMIT].
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_LIMIT)
}

/// `has_more` is defined as page * limit < total, computed against the full
/// filtered count rather than the slice, so it stays accurate for an
/// out-of-range page whose slice is empty.
pub fn has_more(page: u32, limit: u32, total: u64) -> bool {
    (page as u64) * (limit as u64) < total
}

fn search_term(term: &str) -> Option<&str> {
    let term = term.trim();
    (!term.is_empty()).then_some(term)
}

pub struct CatalogOperations;

impl CatalogOperations {
    pub async fn insert_asset(
        pool: &PgPool,
        name: &str,
        key: &str,
        size: i64,
        media_type: &str,
    ) -> AppResult<Asset> {
        let sql = format!(
            "INSERT INTO assets (id, name, key, size, media_type) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ASSET_COLUMNS}"
        );
        let asset = sqlx::query_as::<_, Asset>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(key)
            .bind(size)
            .bind(media_type)
            .fetch_one(pool)
            .await?;

        Ok(asset)
    }

    pub async fn get_asset(pool: &PgPool, id: Uuid) -> AppResult<Option<Asset>> {
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1");
        let asset = sqlx::query_as::<_, Asset>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(asset)
    }

    /// Legacy listing: every matching asset, newest first, no truncation.
    /// Kept for callers that omit page/limit.
    pub async fn list_all(pool: &PgPool, term: &str) -> AppResult<Vec<Asset>> {
        let assets = match search_term(term) {
            Some(term) => {
                let sql = format!(
                    "SELECT {ASSET_COLUMNS} FROM assets \
                     WHERE to_tsvector('english', name) @@ plainto_tsquery('english', $1) \
                     ORDER BY created_at DESC, seq DESC"
                );
                sqlx::query_as::<_, Asset>(&sql)
                    .bind(term)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ASSET_COLUMNS} FROM assets ORDER BY created_at DESC, seq DESC"
                );
                sqlx::query_as::<_, Asset>(&sql).fetch_all(pool).await?
            }
        };

        Ok(assets)
    }

    /// Count of assets matching the same filter as the page slice.
    pub async fn count(pool: &PgPool, term: &str) -> AppResult<u64> {
        let total: i64 = match search_term(term) {
            Some(term) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM assets \
                     WHERE to_tsvector('english', name) @@ plainto_tsquery('english', $1)",
                )
                .bind(term)
                .fetch_one(pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM assets")
                    .fetch_one(pool)
                    .await?
            }
        };

        Ok(total as u64)
    }

    /// One bounded, ordered slice. Callers are expected to pass already
    /// clamped page/limit values.
    pub async fn list_page(
        pool: &PgPool,
        term: &str,
        page: u32,
        limit: u32,
    ) -> AppResult<Vec<Asset>> {
        let offset = ((page - 1) as i64) * (limit as i64);
        let assets = match search_term(term) {
            Some(term) => {
                let sql = format!(
                    "SELECT {ASSET_COLUMNS} FROM assets \
                     WHERE to_tsvector('english', name) @@ plainto_tsquery('english', $1) \
                     ORDER BY created_at DESC, seq DESC \
                     LIMIT $2 OFFSET $3"
                );
                sqlx::query_as::<_, Asset>(&sql)
                    .bind(term)
                    .bind(limit as i64)
                    .bind(offset)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ASSET_COLUMNS} FROM assets \
                     ORDER BY created_at DESC, seq DESC \
                     LIMIT $1 OFFSET $2"
                );
                sqlx::query_as::<_, Asset>(&sql)
                    .bind(limit as i64)
                    .bind(offset)
                    .fetch_all(pool)
                    .await?
            }
        };

        Ok(assets)
    }

    /// Paginated catalog query: clamps the cursor, fetches the slice and the
    /// total under the same filter, and derives `has_more` from the total.
    pub async fn query_page(
        pool: &PgPool,
        term: &str,
        page: u32,
        limit: u32,
    ) -> AppResult<PageResponse> {
        let page = clamp_page(page);
        let limit = clamp_limit(limit);

        let total = Self::count(pool, term).await?;
        let items = Self::list_page(pool, term, page, limit).await?;

        Ok(PageResponse {
            items,
            page,
            limit,
            total,
            has_more: has_more(page, limit, total),
        })
    }
}
