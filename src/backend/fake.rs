//! In-memory backend for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::AlertBackend;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{ThreatId, ThreatStatus};

pub(crate) struct FakeBackend {
    alerts: Mutex<DashboardResult<Vec<serde_json::Value>>>,
    update_result: Mutex<DashboardResult<()>>,
    gate: Option<Arc<Semaphore>>,
    fetch_calls: AtomicUsize,
    update_calls: Mutex<Vec<(ThreatId, ThreatStatus)>>,
}

impl FakeBackend {
    pub fn with_alerts(alerts: serde_json::Value) -> Self {
        let alerts = match alerts {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        Self {
            alerts: Mutex::new(Ok(alerts)),
            update_result: Mutex::new(Ok(())),
            gate: None,
            fetch_calls: AtomicUsize::new(0),
            update_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: DashboardError) -> Self {
        let backend = Self::with_alerts(serde_json::json!([]));
        *backend.alerts.lock() = Err(err);
        backend
    }

    /// Status updates block until `release` hands out a permit
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn set_alerts(&self, alerts: DashboardResult<Vec<serde_json::Value>>) {
        *self.alerts.lock() = alerts;
    }

    pub fn set_update_result(&self, result: DashboardResult<()>) {
        *self.update_result.lock() = result;
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> Vec<(ThreatId, ThreatStatus)> {
        self.update_calls.lock().clone()
    }
}

#[async_trait]
impl AlertBackend for FakeBackend {
    async fn fetch_alerts(&self) -> DashboardResult<Vec<serde_json::Value>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.alerts.lock().clone()
    }

    async fn update_status(&self, id: &ThreatId, status: &ThreatStatus) -> DashboardResult<()> {
        self.update_calls.lock().push((id.clone(), status.clone()));
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        self.update_result.lock().clone()
    }
}
