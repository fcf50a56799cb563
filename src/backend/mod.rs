//! Alert Backend Module - Dashboard to Backend Communication
//!
//! This module handles:
//! - Fetching the current alert set (`GET /alerts`)
//! - Threat status transitions (`PATCH /threats/{id}/status`)
//!
//! The store and updater only see the `AlertBackend` trait, so tests can swap
//! the HTTP client for an in-memory fake.

pub mod client;

#[cfg(test)]
pub(crate) mod fake;

pub use client::AlertClient;

use async_trait::async_trait;

use crate::error::DashboardResult;
use crate::models::{ThreatId, ThreatStatus};

/// Remote source of threat alerts
#[async_trait]
pub trait AlertBackend: Send + Sync {
    /// Full current alert set, one JSON object per alert, not yet normalized
    async fn fetch_alerts(&self) -> DashboardResult<Vec<serde_json::Value>>;

    /// Ask the backend to move a threat to `status`
    async fn update_status(&self, id: &ThreatId, status: &ThreatStatus) -> DashboardResult<()>;
}
