//! Threat Store
//!
//! Authoritative in-memory record set for the session. Readers get an
//! `Arc` snapshot; a load swaps the whole list, a status change copies on
//! write, so a snapshot never changes under its holder.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::backend::AlertBackend;
use crate::error::DashboardResult;
use crate::models::{RawThreatRecord, ThreatId, ThreatRecord, ThreatStatus};

/// Outcome of the most recent load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Pending,
    Loaded { count: usize, at: DateTime<Utc> },
    Failed { reason: String, at: DateTime<Utc> },
}

pub struct ThreatStore {
    backend: Arc<dyn AlertBackend>,
    records: RwLock<Arc<Vec<ThreatRecord>>>,
    state: RwLock<LoadState>,
}

impl ThreatStore {
    pub fn new(backend: Arc<dyn AlertBackend>) -> Self {
        Self {
            backend,
            records: RwLock::new(Arc::new(Vec::new())),
            state: RwLock::new(LoadState::Pending),
        }
    }

    /// Replace the record set with the backend's current alerts.
    ///
    /// On failure the store is emptied (stale data is discarded) and the
    /// error is handed back for the view to report.
    pub async fn load(&self) -> DashboardResult<usize> {
        match self.backend.fetch_alerts().await {
            Ok(payload) => {
                let records = normalize_batch(payload);
                let count = records.len();

                *self.records.write() = Arc::new(records);
                *self.state.write() = LoadState::Loaded { count, at: Utc::now() };

                tracing::info!("Loaded {} threat records", count);
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("Failed to load threats: {}", e);

                *self.records.write() = Arc::new(Vec::new());
                *self.state.write() = LoadState::Failed {
                    reason: e.to_string(),
                    at: Utc::now(),
                };
                Err(e)
            }
        }
    }

    /// Current snapshot, in the order the backend sent it
    pub fn list(&self) -> Arc<Vec<ThreatRecord>> {
        self.records.read().clone()
    }

    pub fn get(&self, id: &ThreatId) -> Option<ThreatRecord> {
        self.records.read().iter().find(|r| &r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn load_state(&self) -> LoadState {
        self.state.read().clone()
    }

    /// Set the status of record `id`. Unknown ids are ignored; returns
    /// whether a record was changed.
    pub fn apply_status_change(&self, id: &ThreatId, status: ThreatStatus) -> bool {
        let mut records = self.records.write();

        let Some(index) = records.iter().position(|r| &r.id == id) else {
            tracing::debug!("Status change for unknown threat {} ignored", id);
            return false;
        };

        Arc::make_mut(&mut *records)[index].status = Some(status);
        true
    }
}

/// Normalize a backend payload. Elements that are not valid alerts are
/// skipped; a repeated id keeps its first occurrence.
pub fn normalize_batch(payload: Vec<serde_json::Value>) -> Vec<ThreatRecord> {
    let mut seen: HashSet<ThreatId> = HashSet::with_capacity(payload.len());
    let mut records = Vec::with_capacity(payload.len());

    for (index, value) in payload.into_iter().enumerate() {
        let raw: RawThreatRecord = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping alert #{}: {}", index, e);
                continue;
            }
        };

        if !seen.insert(raw.id.clone()) {
            tracing::warn!("Skipping alert #{}: duplicate id {}", index, raw.id);
            continue;
        }

        records.push(raw.normalize());
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::error::DashboardError;
    use crate::models::Severity;
    use serde_json::json;

    fn store_with(backend: FakeBackend) -> (Arc<FakeBackend>, ThreatStore) {
        let backend = Arc::new(backend);
        let store = ThreatStore::new(backend.clone());
        (backend, store)
    }

    #[test]
    fn test_load_replaces_contents() {
        let (backend, store) = store_with(FakeBackend::with_alerts(json!([
            {"id": 1, "type": "Malware", "severity": "Critical", "status": "Active",
             "timestamp": "2025-05-18T10:00:00Z"}
        ])));

        assert_eq!(store.load_state(), LoadState::Pending);
        let count = tokio_test::block_on(store.load()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(backend.fetch_calls(), 1);
        let records = store.list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, ThreatId::Int(1));
        assert_eq!(records[0].severity, Some(Severity::Critical));
        assert!(matches!(store.load_state(), LoadState::Loaded { count: 1, .. }));
    }

    #[test]
    fn test_failed_load_empties_store() {
        let (backend, store) = store_with(FakeBackend::with_alerts(json!([
            {"id": 1, "status": "Active"},
            {"id": 2, "status": "Active"}
        ])));
        tokio_test::block_on(store.load()).unwrap();
        assert_eq!(store.len(), 2);

        backend.set_alerts(Err(DashboardError::RemoteRejection { status: 500, body: String::new() }));
        let err = tokio_test::block_on(store.load()).unwrap_err();

        assert!(matches!(err, DashboardError::RemoteRejection { status: 500, .. }));
        assert!(store.is_empty());
        assert!(matches!(store.load_state(), LoadState::Failed { .. }));
    }

    #[test]
    fn test_reload_replaces_previous_set() {
        let (backend, store) = store_with(FakeBackend::with_alerts(json!([
            {"id": 1, "type": "Malware", "status": "Active"},
            {"id": 2, "type": "Phishing", "status": "Active"}
        ])));
        tokio_test::block_on(store.load()).unwrap();
        let first = store.list();

        backend.set_alerts(Ok(vec![
            json!({"id": 3, "type": "Worm", "status": "Investigating"}),
        ]));
        assert_eq!(tokio_test::block_on(store.load()).unwrap(), 1);

        let ids: Vec<String> = first.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(first[0].type_label(), "Malware");

        let second = store.list();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, ThreatId::Int(3));
        assert_eq!(second[0].status, Some(ThreatStatus::Investigating));
        assert!(store.get(&ThreatId::Int(1)).is_none());
        assert_eq!(backend.fetch_calls(), 2);
    }

    #[test]
    fn test_network_failure_is_recoverable() {
        let (_, store) = store_with(FakeBackend::failing(DashboardError::Network("refused".into())));
        let err = tokio_test::block_on(store.load()).unwrap_err();
        assert!(err.is_recoverable());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_list_preserves_backend_order() {
        let (_, store) = store_with(FakeBackend::with_alerts(json!([
            {"id": 3}, {"id": 1}, {"id": "b"}, {"id": 2}
        ])));
        tokio_test::block_on(store.load()).unwrap();

        let ids: Vec<String> = store.list().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["3", "1", "b", "2"]);
    }

    #[test]
    fn test_apply_status_change() {
        let (_, store) = store_with(FakeBackend::with_alerts(json!([
            {"id": 1, "status": "Active"}
        ])));
        tokio_test::block_on(store.load()).unwrap();

        let before = store.list();
        assert!(store.apply_status_change(&ThreatId::Int(1), ThreatStatus::Investigating));

        // earlier snapshot is untouched
        assert_eq!(before[0].status, Some(ThreatStatus::Active));
        assert_eq!(store.get(&ThreatId::Int(1)).unwrap().status, Some(ThreatStatus::Investigating));
    }

    #[test]
    fn test_apply_status_change_unknown_id_is_noop() {
        let (_, store) = store_with(FakeBackend::with_alerts(json!([
            {"id": 1, "status": "Active"}
        ])));
        tokio_test::block_on(store.load()).unwrap();

        assert!(!store.apply_status_change(&ThreatId::Int(99), ThreatStatus::Resolved));
        assert_eq!(store.get(&ThreatId::Int(1)).unwrap().status, Some(ThreatStatus::Active));
    }

    #[test]
    fn test_normalize_batch_skips_invalid_and_duplicates() {
        let records = normalize_batch(vec![
            json!({"id": 1, "type": "Phishing"}),
            json!({"type": "no id"}),
            json!("not an object"),
            json!({"id": 1, "type": "Duplicate"}),
            json!({"id": 2}),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].type_label(), "Phishing");
        assert_eq!(records[1].id, ThreatId::Int(2));
    }

    #[test]
    fn test_normalize_batch_keeps_records_with_off_type_fields() {
        let records = normalize_batch(vec![
            json!({"id": 1, "type": "Malware", "severity": 3, "status": "Active"}),
            json!({"id": 2, "type": "Phishing", "severity": "High", "source": 42}),
            json!({"id": 3, "type": "Malware", "severity": "Low", "anomaly_score": "n/a"}),
        ]);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].severity, Some(Severity::Other("3".into())));
        assert_eq!(records[1].source_label(), "42");
        assert!(records[2].analysis.is_none());

        let summary = crate::logic::compute_summary(&records);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.high + summary.low, 2);

        let groups = crate::logic::group_by_type(&records);
        assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), 3);
    }
}
