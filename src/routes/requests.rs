use axum::{extract::State, routing::post, Json, Router};
use tracing::info;
use validator::Validate;

use crate::models::{AppState, AssetRequest};
use crate::notify::Mailer;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/requests", post(send_request))
        .with_state(state)
}

/// Forward an asset request to the operators by email. Validation failures
/// are the user's to fix; provider failures surface as 502.
async fn send_request(
    State(state): State<AppState>,
    Json(payload): Json<AssetRequest>,
) -> AppResult<Json<serde_json::Value>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mailer = Mailer::from_config(&state.config.notify)?;
    mailer.send_request(&payload).await?;

    info!(from = %payload.email, "asset request forwarded");
    Ok(Json(serde_json::json!({ "message": "Request sent successfully" })))
}
