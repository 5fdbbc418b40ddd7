use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::models::{JoinToken, JoinTokenClaims, ParticipantRole, VideoConferencingError};

type HmacSha256 = Hmac<Sha256>;

/// Mints `<claims>.<signature>` join tokens bound to one session and participant.
#[derive(Clone)]
pub struct JoinTokenSigner {
    secret: Vec<u8>,
}

impl JoinTokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, VideoConferencingError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| VideoConferencingError::Internal {
            message: format!("Failed to create HMAC: {}", e),
        })
    }

    pub fn sign(
        &self,
        session_id: &str,
        user_id: &str,
        role: ParticipantRole,
        expires_at: DateTime<Utc>,
    ) -> Result<JoinToken, VideoConferencingError> {
        if self.secret.is_empty() {
            return Err(VideoConferencingError::NotConfigured);
        }

        let claims = JoinTokenClaims {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            role,
            exp: expires_at.timestamp(),
        };
        let payload = serde_json::to_vec(&claims).map_err(|e| VideoConferencingError::Internal {
            message: e.to_string(),
        })?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac()?;
        mac.update(payload_b64.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(JoinToken {
            token: format!("{}.{}", payload_b64, signature_b64),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JoinTokenClaims, VideoConferencingError> {
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| VideoConferencingError::InvalidToken("malformed token".to_string()))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| VideoConferencingError::InvalidToken("bad signature encoding".to_string()))?;

        let mut mac = self.mac()?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| VideoConferencingError::InvalidToken("signature mismatch".to_string()))?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| VideoConferencingError::InvalidToken("bad payload encoding".to_string()))?;
        let claims: JoinTokenClaims = serde_json::from_slice(&payload)
            .map_err(|e| VideoConferencingError::InvalidToken(e.to_string()))?;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| VideoConferencingError::InvalidToken("bad expiry".to_string()))?;
        if expires_at <= now {
            debug!("Join token for session {} expired at {}", claims.session_id, expires_at);
            return Err(VideoConferencingError::TokenExpired);
        }

        Ok(claims)
    }
}
