// libs/video-conferencing-cell/src/services/provider.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::models::{SessionContext, VideoConferencingError, VideoSession};
use crate::services::cloudflare::CloudflareRealtimeClient;

/// Opens the video room attached to a booked appointment.
#[async_trait]
pub trait VideoSessionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_session(
        &self,
        context: &SessionContext,
    ) -> Result<VideoSession, VideoConferencingError>;
}

/// Local provider used when no Cloudflare credentials are configured.
/// Session ids are derived from the appointment so they are stable.
#[derive(Debug, Default, Clone)]
pub struct DevVideoProvider;

impl DevVideoProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VideoSessionProvider for DevVideoProvider {
    fn name(&self) -> &'static str {
        "dev"
    }

    async fn create_session(
        &self,
        context: &SessionContext,
    ) -> Result<VideoSession, VideoConferencingError> {
        Ok(VideoSession {
            session_id: format!("dev-{}", context.appointment_id),
            provider: self.name().to_string(),
            created_at: Utc::now(),
        })
    }
}

/// Cloudflare when configured, otherwise the dev provider.
pub fn provider_from_config(config: &AppConfig) -> Arc<dyn VideoSessionProvider> {
    match CloudflareRealtimeClient::new(config) {
        Ok(client) => {
            info!("Video sessions will be created on Cloudflare Realtime");
            Arc::new(client)
        }
        Err(_) => {
            warn!("Cloudflare Realtime not configured, using dev video provider");
            Arc::new(DevVideoProvider::new())
        }
    }
}
