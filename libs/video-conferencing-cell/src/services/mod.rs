// libs/video-conferencing-cell/src/services/mod.rs

pub mod cloudflare;
pub mod provider;
pub mod token;

pub use cloudflare::CloudflareRealtimeClient;
pub use provider::{provider_from_config, DevVideoProvider, VideoSessionProvider};
pub use token::JoinTokenSigner;
