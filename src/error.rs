//! Error handling

use std::time::Duration;

use thiserror::Error;

use crate::models::{ThreatId, ThreatStatus};

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    // Transport errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    // Backend errors
    #[error("Backend rejected request ({status}): {body}")]
    RemoteRejection { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    // Local precondition errors
    #[error("Threat {0} not found")]
    NotFound(ThreatId),

    #[error("Threat {id} cannot move from {from} to {to}")]
    IllegalTransition {
        id: ThreatId,
        from: String,
        to: ThreatStatus,
    },

    #[error("Status update already in flight for threat {0}")]
    UpdateInFlight(ThreatId),

    // Startup errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DashboardError {
    /// Everything except a bad configuration is surfaced to the operator and
    /// leaves the session usable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DashboardError::Config(_))
    }

    /// Request could not be sent or did not complete in time
    pub fn is_transient(&self) -> bool {
        matches!(self, DashboardError::Network(_) | DashboardError::Timeout(_))
    }

    /// Rejected before any request was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DashboardError::NotFound(_)
                | DashboardError::IllegalTransition { .. }
                | DashboardError::UpdateInFlight(_)
        )
    }
}
