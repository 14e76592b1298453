// Outbound email for asset requests (Resend-compatible HTTP API)

use reqwest::Client;
use serde::Serialize;
use tracing::error;

use crate::config::NotifyConfig;
use crate::models::AssetRequest;
use crate::types::{AppError, AppResult};

#[derive(Serialize)]
struct EmailPayload {
    from: String,
    to: Vec<String>,
    subject: String,
    text: String,
}

pub struct Mailer {
    client: Client,
    api_base: String,
    api_key: String,
    from_email: String,
    to_email: String,
}

impl Mailer {
    /// Fails with a server-side error when the provider is not configured;
    /// the request payload itself is validated before this is reached.
    pub fn from_config(config: &NotifyConfig) -> AppResult<Self> {
        let (api_key, from_email, to_email) = match (
            config.api_key.clone(),
            config.from_email.clone(),
            config.to_email.clone(),
        ) {
            (Some(key), Some(from), Some(to)) => (key, from, to),
            _ => {
                return Err(AppError::Internal(
                    "email not configured on server".to_string(),
                ))
            }
        };

        Ok(Self {
            client: Client::new(),
            api_base: config.api_base.clone(),
            api_key,
            from_email,
            to_email,
        })
    }

    pub async fn send_request(&self, request: &AssetRequest) -> AppResult<()> {
        let subject = format!("New Video Request from {}", request.name);

        let mut lines = vec![
            format!("Name: {}", request.name),
            format!("Email: {}", request.email),
        ];
        if let Some(asset_name) = &request.asset_name {
            lines.push(format!("Requested Video: {asset_name}"));
        }
        lines.push(format!("Message: {}", request.message));
        lines.push(format!("Time: {}", chrono::Utc::now().to_rfc3339()));

        let payload = EmailPayload {
            from: self.from_email.clone(),
            to: vec![self.to_email.clone()],
            subject,
            text: lines.join("\n"),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "email provider rejected the request");
            return Err(AppError::Email(format!("provider returned {status}")));
        }

        Ok(())
    }
}
