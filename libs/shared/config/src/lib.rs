use std::env;
use std::str::FromStr;

use chrono_tz::Tz;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub cloudflare_realtime_app_id: String,
    pub cloudflare_realtime_api_token: String,
    pub cloudflare_realtime_base_url: String,
    pub video_token_secret: String,
    pub storage_backend: StorageBackend,
    pub server_port: u16,
    pub scheduling: SchedulingConfig,
}

/// Where doctors, appointments and credit balances are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Supabase,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(StorageBackend::Supabase),
            "memory" | "in-memory" | "in_memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Knobs for slot generation and booking.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub slot_duration_minutes: i64,
    pub lookahead_minutes: i64,
    pub horizon_days: u32,
    pub appointment_price_credits: i64,
    pub video_join_window_minutes: i64,
    pub timezone: Tz,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 30,
            lookahead_minutes: 15,
            horizon_days: 4,
            appointment_price_credits: 2,
            video_join_window_minutes: 30,
            timezone: Tz::UTC,
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            slot_duration_minutes: parse_env("SLOT_DURATION_MINUTES", defaults.slot_duration_minutes)
                .max(1),
            lookahead_minutes: parse_env("BOOKING_LOOKAHEAD_MINUTES", defaults.lookahead_minutes)
                .max(0),
            horizon_days: parse_env("SLOT_HORIZON_DAYS", defaults.horizon_days).max(1),
            appointment_price_credits: parse_env(
                "APPOINTMENT_PRICE_CREDITS",
                defaults.appointment_price_credits,
            )
            .max(0),
            video_join_window_minutes: parse_env(
                "VIDEO_JOIN_WINDOW_MINUTES",
                defaults.video_join_window_minutes,
            )
            .max(0),
            timezone: parse_env("CLINIC_TIMEZONE", defaults.timezone),
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_jwt_secret = env::var("SUPABASE_JWT_SECRET")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_JWT_SECRET not set, using empty value");
                String::new()
            });

        let mut config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            video_token_secret: env::var("VIDEO_TOKEN_SECRET")
                .unwrap_or_else(|_| supabase_jwt_secret.clone()),
            supabase_jwt_secret,
            cloudflare_realtime_app_id: env::var("CLOUDFLARE_REALTIME_APP_ID")
                .unwrap_or_else(|_| {
                    warn!("CLOUDFLARE_REALTIME_APP_ID not set, video sessions will use the dev provider");
                    String::new()
                }),
            cloudflare_realtime_api_token: env::var("CLOUDFLARE_REALTIME_API_TOKEN")
                .unwrap_or_default(),
            cloudflare_realtime_base_url: env::var("CLOUDFLARE_REALTIME_BASE_URL")
                .unwrap_or_else(|_| "https://rtc.live.cloudflare.com/v1".to_string()),
            storage_backend: StorageBackend::Memory,
            server_port: parse_env("SERVER_PORT", 3000),
            scheduling: SchedulingConfig::from_env(),
        };

        config.storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("{}, falling back to in-memory storage", e);
                StorageBackend::Memory
            }),
            Err(_) if config.is_configured() => StorageBackend::Supabase,
            Err(_) => StorageBackend::Memory,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_video_conferencing_configured(&self) -> bool {
        !self.cloudflare_realtime_app_id.is_empty()
            && !self.cloudflare_realtime_api_token.is_empty()
            && !self.cloudflare_realtime_base_url.is_empty()
    }
}
