// libs/video-conferencing-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// SESSION MODELS
// ==============================================================================

/// What a provider needs to know to open a room for an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Opaque handle returned by a provider; stored on the appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoSession {
    pub session_id: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Patient,
    Doctor,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Patient => "patient",
            ParticipantRole::Doctor => "doctor",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinTokenClaims {
    pub session_id: String,
    pub user_id: String,
    pub role: ParticipantRole,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ==============================================================================
// CLOUDFLARE REALTIME API MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudflareSessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "errorCode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(rename = "errorDescription", skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum VideoConferencingError {
    #[error("Video conferencing not configured")]
    NotConfigured,

    #[error("Cloudflare API error: {message}")]
    CloudflareApiError { message: String },

    #[error("Invalid join token: {0}")]
    InvalidToken(String),

    #[error("Join token expired")]
    TokenExpired,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<reqwest::Error> for VideoConferencingError {
    fn from(err: reqwest::Error) -> Self {
        VideoConferencingError::CloudflareApiError {
            message: err.to_string(),
        }
    }
}
