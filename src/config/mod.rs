//! Configuration module for the TicShare client core.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! Values the deployment never varies (override key, name cap, warning ratio)
//! are build-time constants.

use std::env;
use std::time::Duration;

/// Maximum length of an account display name, in characters.
pub const MAX_NAME_LENGTH: usize = 20;

/// Minimum length of a newly chosen account secret.
pub const MIN_SECRET_LENGTH: usize = 4;

/// Shared static override key accepted by the secret-reset operation.
///
/// Known weakness carried over from the original deployment: one fixed key
/// resets any account's secret. Deliberately not hardened.
pub const OVERRIDE_KEY: &str = "1233";

/// Fraction of the storage quota at which the one-shot warning fires.
pub const QUOTA_WARN_RATIO: f64 = 0.80;

/// How long an emitted notification stays visible before auto-dismissal.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote document store (no trailing slash)
    pub remote_base_url: String,
    /// Upload size ceiling in bytes; inputs above this are rejected
    pub max_upload_bytes: u64,
    /// Storage quota capacity in bytes for the per-account usage warning
    pub quota_capacity_bytes: u64,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let remote_base_url = env::var("TICSHARE_REMOTE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:9000".to_string())
            .trim_end_matches('/')
            .to_string();

        let max_upload_bytes = env::var("TICSHARE_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500 * 1024 * 1024);

        let quota_capacity_bytes = env::var("TICSHARE_QUOTA_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1024 * 1024 * 1024);

        let log_level = env::var("TICSHARE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            remote_base_url,
            max_upload_bytes,
            quota_capacity_bytes,
            log_level,
        }
    }
}
