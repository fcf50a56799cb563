//! Threat Status Updater
//!
//! Drives a threat through `Active -> Investigating -> Resolved` on the
//! backend, then mirrors the acknowledged status into the store. The store
//! is never updated ahead of the backend.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::store::ThreatStore;
use crate::backend::AlertBackend;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{ThreatId, ThreatRecord, ThreatStatus};

/// The one transition the dashboard offers from `current`, if any.
///
/// `Contained`, unknown and missing statuses have no outgoing transition.
pub fn allowed_transition(current: Option<&ThreatStatus>) -> Option<ThreatStatus> {
    match current {
        Some(ThreatStatus::Active) => Some(ThreatStatus::Investigating),
        Some(ThreatStatus::Investigating) => Some(ThreatStatus::Resolved),
        _ => None,
    }
}

pub struct ThreatStatusUpdater {
    store: Arc<ThreatStore>,
    backend: Arc<dyn AlertBackend>,
    in_flight: Mutex<HashSet<ThreatId>>,
}

/// Marks an id busy until dropped, including when the calling future is
/// cancelled mid-request.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<ThreatId>>,
    id: ThreatId,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<ThreatId>>, id: &ThreatId) -> DashboardResult<Self> {
        if !set.lock().insert(id.clone()) {
            return Err(DashboardError::UpdateInFlight(id.clone()));
        }
        Ok(Self { set, id: id.clone() })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

impl ThreatStatusUpdater {
    pub fn new(store: Arc<ThreatStore>, backend: Arc<dyn AlertBackend>) -> Self {
        Self {
            store,
            backend,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_in_flight(&self, id: &ThreatId) -> bool {
        self.in_flight.lock().contains(id)
    }

    /// Move threat `id` to `target` on the backend, then in the store.
    ///
    /// Illegal transitions, unknown ids and concurrent updates of the same
    /// id are rejected before any request is sent. A backend failure leaves
    /// the store untouched. Returns the updated record.
    pub async fn set_status(&self, id: &ThreatId, target: ThreatStatus) -> DashboardResult<ThreatRecord> {
        let record = self.store
            .get(id)
            .ok_or_else(|| DashboardError::NotFound(id.clone()))?;

        if allowed_transition(record.status.as_ref()) != Some(target.clone()) {
            tracing::debug!("Rejected transition for threat {}: {} -> {}", id, record.status_label(), target);
            return Err(DashboardError::IllegalTransition {
                id: id.clone(),
                from: record.status_label().to_string(),
                to: target,
            });
        }

        let _guard = InFlightGuard::acquire(&self.in_flight, id)?;

        if let Err(e) = self.backend.update_status(id, &target).await {
            tracing::warn!("Status update for threat {} to {} failed: {}", id, target, e);
            return Err(e);
        }

        self.store.apply_status_change(id, target.clone());
        tracing::info!("Threat {} status updated to {}", id, target);

        let mut updated = record;
        updated.status = Some(target);
        Ok(self.store.get(id).unwrap_or(updated))
    }

    /// Active -> Investigating
    pub async fn investigate(&self, id: &ThreatId) -> DashboardResult<ThreatRecord> {
        self.set_status(id, ThreatStatus::Investigating).await
    }

    /// Investigating -> Resolved
    pub async fn resolve(&self, id: &ThreatId) -> DashboardResult<ThreatRecord> {
        self.set_status(id, ThreatStatus::Resolved).await
    }
}
