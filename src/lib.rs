// Clipshelf - media asset catalog with signed-URL downloads and lazy previews

pub mod config;
pub mod db;
pub mod models;
pub mod types;
pub mod storage;
pub mod ingest;
pub mod routes;
pub mod middleware;
pub mod notify;
pub mod client;    // Framework-agnostic browsing core (paginator, prefetch)

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
// Note: Import specific items from types module instead of glob to avoid name conflicts
// e.g., use clipshelf::types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
