//! Record filters for the threat list and detail views

use crate::models::{Severity, ThreatId, ThreatRecord, ThreatStatus};

/// Severity / status / free-text filter. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ThreatFilter {
    pub severity: Option<Severity>,
    pub status: Option<ThreatStatus>,
    pub search: Option<String>,
}

impl ThreatFilter {
    pub fn is_empty(&self) -> bool {
        self.severity.is_none() && self.status.is_none() && self.search.is_none()
    }

    pub fn matches(&self, record: &ThreatRecord) -> bool {
        if let Some(severity) = &self.severity {
            if !record.has_severity(severity) {
                return false;
            }
        }

        if let Some(status) = &self.status {
            if !record.has_status(status) {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                let id = record.id.to_string();
                let hit = [
                    Some(id.as_str()),
                    record.threat_type.as_deref(),
                    record.source.as_deref(),
                    record.target.as_deref(),
                    record.details.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
                hit
            }
            _ => true,
        }
    }

    pub fn apply<'a>(&self, records: &'a [ThreatRecord]) -> Vec<&'a ThreatRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Active or Investigating, any severity: the dashboard's action table
pub fn open_threats(records: &[ThreatRecord]) -> Vec<&ThreatRecord> {
    records.iter().filter(|r| r.is_open()).collect()
}

/// Open and Critical/High
pub fn active_threats(records: &[ThreatRecord]) -> Vec<&ThreatRecord> {
    records.iter().filter(|r| r.is_active_threat()).collect()
}

pub fn find<'a>(records: &'a [ThreatRecord], id: &ThreatId) -> Option<&'a ThreatRecord> {
    records.iter().find(|r| &r.id == id)
}

/// Lookup by the id as typed by an operator; `1` matches both `1` and `"1"`
pub fn find_by_label<'a>(records: &'a [ThreatRecord], label: &str) -> Option<&'a ThreatRecord> {
    let label = label.trim();
    records.iter().find(|r| r.id.to_string() == label)
}
