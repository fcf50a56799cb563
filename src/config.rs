//! Configuration module

use std::time::Duration;

use validator::Validate;

use crate::constants;
use crate::error::{DashboardError, DashboardResult};

/// Dashboard client configuration
#[derive(Debug, Clone, Validate)]
pub struct DashboardConfig {
    /// Alert backend base URL
    #[validate(url)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Entries shown in the recent activity timeline
    #[validate(range(min = 1, max = 100))]
    pub timeline_limit: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_API_URL.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT,
            timeline_limit: constants::DEFAULT_TIMELINE_LIMIT,
            environment: "development".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            base_url: constants::get_api_url(),
            request_timeout_secs: constants::get_request_timeout(),
            timeline_limit: constants::get_timeline_limit(),
            environment: constants::get_environment(),
        }
    }

    /// Validate and hand back the config, mapping failures to `DashboardError::Config`
    pub fn validated(self) -> DashboardResult<Self> {
        self.validate()
            .map_err(|e| DashboardError::Config(e.to_string()))?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
