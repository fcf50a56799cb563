//! Alert API Client
//!
//! HTTP client for communicating with the alert backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, Url};

use super::AlertBackend;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{ThreatId, ThreatStatus, UpdateStatusRequest};

/// Alert API client
pub struct AlertClient {
    base_url: Url,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl AlertClient {
    /// Create new alert client
    pub fn new(config: &DashboardConfig) -> DashboardResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DashboardError::Config(format!("invalid base URL {}: {}", config.base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(DashboardError::Config(format!("base URL {} cannot carry a path", config.base_url)));
        }

        let timeout = config.request_timeout();
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            timeout,
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn transport_error(&self, err: reqwest::Error) -> DashboardError {
        if err.is_timeout() {
            DashboardError::Timeout(self.timeout)
        } else {
            DashboardError::Network(err.to_string())
        }
    }

    async fn rejection(response: Response) -> DashboardError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        DashboardError::RemoteRejection { status, body }
    }
}

#[async_trait]
impl AlertBackend for AlertClient {
    async fn fetch_alerts(&self) -> DashboardResult<Vec<serde_json::Value>> {
        let url = self.endpoint(&["alerts"]);
        tracing::debug!("GET {}", url);

        let response = self.http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response.json::<Vec<serde_json::Value>>().await.map_err(|e| {
            if e.is_timeout() {
                DashboardError::Timeout(self.timeout)
            } else {
                DashboardError::Parse(e.to_string())
            }
        })
    }

    async fn update_status(&self, id: &ThreatId, status: &ThreatStatus) -> DashboardResult<()> {
        let id_segment = id.to_string();
        let url = self.endpoint(&["threats", &id_segment, "status"]);
        tracing::debug!("PATCH {} -> {}", url, status);

        let request = UpdateStatusRequest { status: status.clone() };

        let response = self.http_client
            .patch(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }
}
