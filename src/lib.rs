//! CyberSentinel Threat Dashboard Client
//!
//! Client-side core of the security-operations dashboard.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 SENTINEL DASHBOARD CLIENT                │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌────────────────┐ │
//! │  │ ThreatStore │◄──│ StatusUpdater│   │ Metrics / Query│ │
//! │  │  (snapshot) │   │ (in-flight)  │   │   (pure)       │ │
//! │  └──────┬──────┘   └──────┬───────┘   └────────────────┘ │
//! │         └────────┬────────┘                              │
//! │                  ▼                                       │
//! │          ┌───────────────┐                               │
//! │          │ AlertBackend  │  GET /alerts                  │
//! │          │  (reqwest)    │  PATCH /threats/{id}/status   │
//! │          └───────────────┘                               │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod logic;
pub mod models;

pub use backend::{AlertBackend, AlertClient};
pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardResult};
pub use logic::{DashboardSession, ThreatStatusUpdater, ThreatStore};
pub use models::{Severity, ThreatId, ThreatRecord, ThreatStatus};
