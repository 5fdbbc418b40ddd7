// libs/video-conferencing-cell/src/lib.rs
//! # Video Conferencing Cell
//!
//! Opens one video session per booked appointment and signs the short-lived
//! join tokens participants present to enter it.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                   Video Cell                        |
//! +-----------------------------------------------------+
//! |  models.rs      |  Session, token and API DTOs      |
//! |  services/      |                                   |
//! |    provider.rs  |  VideoSessionProvider + dev impl  |
//! |    cloudflare.rs|  Cloudflare Realtime API client   |
//! |    token.rs     |  HMAC join token signer           |
//! +-----------------------------------------------------+
//! ```
//!
//! ## Configuration
//!
//! - `CLOUDFLARE_REALTIME_APP_ID` - Cloudflare app identifier
//! - `CLOUDFLARE_REALTIME_API_TOKEN` - API authentication token
//! - `CLOUDFLARE_REALTIME_BASE_URL` - API base URL (optional, defaults to production)
//! - `VIDEO_TOKEN_SECRET` - join token signing key (defaults to the JWT secret)
//!
//! Without Cloudflare credentials sessions are created by [`DevVideoProvider`].

pub mod models;
pub mod services;

pub use models::{
    JoinToken, JoinTokenClaims, ParticipantRole, SessionContext, VideoConferencingError,
    VideoSession,
};

pub use services::{
    provider_from_config, CloudflareRealtimeClient, DevVideoProvider, JoinTokenSigner,
    VideoSessionProvider,
};
