//! Application settings read from the Rocket figment.
//!
//! Values come from `Rocket.toml`, then `ROCKET_*` environment variables,
//! and are extracted once at ignition with `AdHoc::config::<AppConfig>()`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub rate_limit: RateLimitConfig,
    pub attachments: AttachmentConfig,
    /// Lowest password score (0-4) accepted when setting a password.
    pub password_min_score: u8,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: i32,
    pub window_seconds: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AttachmentConfig {
    pub max_size_bytes: i64,
    pub allowed_content_types: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            rate_limit: RateLimitConfig::default(),
            attachments: AttachmentConfig::default(),
            password_min_score: 3,
            session_ttl_hours: 72,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            enabled: true,
            max_requests: 120,
            window_seconds: 60,
        }
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        AttachmentConfig {
            max_size_bytes: 25 * 1024 * 1024,
            allowed_content_types: [
                "image/jpeg",
                "image/png",
                "image/webp",
                "application/pdf",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl AttachmentConfig {
    pub fn allows(&self, content_type: &str) -> bool {
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }
}
