//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change the default alert backend, only edit this file.

/// Default alert backend URL
///
/// This is the fallback URL when no environment variable is set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 10;

/// Default number of entries in the recent activity timeline
pub const DEFAULT_TIMELINE_LIMIT: usize = 5;

/// Label rendered for any missing classification, severity, target or time
pub const UNKNOWN_LABEL: &str = "Unknown";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "CyberSentinel";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get alert backend URL from environment or use default
pub fn get_api_url() -> String {
    std::env::var("SENTINEL_API_URL")
        .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Get request timeout from environment or use default
pub fn get_request_timeout() -> u64 {
    std::env::var("SENTINEL_REQUEST_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
}

/// Get timeline length from environment or use default
pub fn get_timeline_limit() -> usize {
    std::env::var("SENTINEL_TIMELINE_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMELINE_LIMIT)
}

/// Get deployment environment name
pub fn get_environment() -> String {
    std::env::var("ENVIRONMENT")
        .unwrap_or_else(|_| "development".to_string())
}
