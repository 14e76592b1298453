//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/catalog` - Catalog listing/search and multipart upload
//! - `/api/catalog/{id}/download` - Time-limited download links
//! - `/api/requests` - Asset request emails
//! - `/api/health` - Health check

pub mod catalog;
pub mod health;
pub mod requests;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let cors = cors_layer(&state.config.server);

    Router::new()
        .merge(catalog::router(state.clone()))
        .merge(requests::router(state))
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
