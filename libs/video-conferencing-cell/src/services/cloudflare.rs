// libs/video-conferencing-cell/src/services/cloudflare.rs
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{CloudflareSessionResponse, SessionContext, VideoConferencingError, VideoSession};
use crate::services::provider::VideoSessionProvider;

/// Cloudflare Realtime API client. One empty session is opened per appointment;
/// tracks are negotiated later by the participants' clients.
/// Based on: https://developers.cloudflare.com/realtime/
#[derive(Debug)]
pub struct CloudflareRealtimeClient {
    client: Client,
    app_id: String,
    api_token: String,
    base_url: String,
}

impl CloudflareRealtimeClient {
    pub fn new(config: &AppConfig) -> Result<Self, VideoConferencingError> {
        if !config.is_video_conferencing_configured() {
            return Err(VideoConferencingError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            app_id: config.cloudflare_realtime_app_id.clone(),
            api_token: config.cloudflare_realtime_api_token.clone(),
            base_url: config.cloudflare_realtime_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST /v1/apps/{appId}/sessions/new
    pub async fn open_session(&self) -> Result<CloudflareSessionResponse, VideoConferencingError> {
        let url = format!("{}/apps/{}/sessions/new", self.base_url, self.app_id);
        debug!("Sending session creation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(&json!({}))
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        debug!("Cloudflare session creation response: {} - {}", status, response_text);

        if !status.is_success() {
            error!("Cloudflare session creation failed: {} - {}", status, response_text);
            return Err(VideoConferencingError::CloudflareApiError {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        let session_response: CloudflareSessionResponse = serde_json::from_str(&response_text)
            .map_err(|e| VideoConferencingError::CloudflareApiError {
                message: format!("Failed to parse session response: {}", e),
            })?;

        self.check_session_errors(&session_response)?;
        Ok(session_response)
    }

    fn check_session_errors(
        &self,
        response: &CloudflareSessionResponse,
    ) -> Result<(), VideoConferencingError> {
        if let Some(error_code) = &response.error_code {
            let message = response
                .error_description
                .as_deref()
                .unwrap_or("Unknown error");
            error!("Cloudflare session error: {} - {}", error_code, message);
            return Err(VideoConferencingError::CloudflareApiError {
                message: format!("{}: {}", error_code, message),
            });
        }
        if response.session_id.is_empty() {
            return Err(VideoConferencingError::CloudflareApiError {
                message: "Session response did not include a session id".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VideoSessionProvider for CloudflareRealtimeClient {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    async fn create_session(
        &self,
        context: &SessionContext,
    ) -> Result<VideoSession, VideoConferencingError> {
        info!("Creating Cloudflare session for appointment {}", context.appointment_id);

        let response = self.open_session().await?;

        info!(
            "Successfully created Cloudflare session {} for appointment {}",
            response.session_id, context.appointment_id
        );

        Ok(VideoSession {
            session_id: response.session_id,
            provider: self.name().to_string(),
            created_at: Utc::now(),
        })
    }
}
