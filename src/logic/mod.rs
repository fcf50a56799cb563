//! Dashboard logic: store, aggregation, status transitions and view helpers

pub mod metrics;
pub mod playbook;
pub mod query;
pub mod store;
pub mod updater;

pub use metrics::{compute_summary, compute_summary_on, group_by_type, recent_timeline, ThreatSummary, TimelineEntry, TypeCount};
pub use playbook::{affected_systems, incident_phases, mitigation_steps, IncidentPhase};
pub use query::{active_threats, open_threats, ThreatFilter};
pub use store::{LoadState, ThreatStore};
pub use updater::{allowed_transition, ThreatStatusUpdater};

use std::sync::Arc;

use crate::backend::{AlertBackend, AlertClient};
use crate::config::DashboardConfig;
use crate::error::DashboardResult;

/// One operator session: a store and an updater sharing a backend
pub struct DashboardSession {
    pub store: Arc<ThreatStore>,
    pub updater: ThreatStatusUpdater,
}

impl DashboardSession {
    pub fn new(backend: Arc<dyn AlertBackend>) -> Self {
        let store = Arc::new(ThreatStore::new(backend.clone()));
        let updater = ThreatStatusUpdater::new(store.clone(), backend);
        Self { store, updater }
    }

    /// Session against the HTTP backend named in `config`
    pub fn connect(config: &DashboardConfig) -> DashboardResult<Self> {
        let client = AlertClient::new(config)?;
        tracing::info!("Alert backend: {}", client.base_url());
        Ok(Self::new(Arc::new(client)))
    }
}
