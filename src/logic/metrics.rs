//! Metrics Aggregator
//!
//! Pure projections over a record snapshot: summary counters, type
//! distribution and the recent activity feed. Recomputed from scratch on
//! every call.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::models::{Severity, ThreatId, ThreatRecord, ThreatStatus, Tone};

// ============================================================================
// SUMMARY
// ============================================================================

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThreatSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Detected on the current local calendar day
    pub new_today: usize,
    pub investigation_pending: usize,
    pub resolved: usize,
    /// Open (Active/Investigating) and Critical/High
    pub active: usize,
}

impl ThreatSummary {
    /// Percentage of all records with `severity`; 0 for an empty set
    pub fn severity_share(&self, severity: &Severity) -> f64 {
        let count = match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Other(_) => self.total - (self.critical + self.high + self.medium + self.low),
        };
        share(count, self.total)
    }
}

pub fn compute_summary(records: &[ThreatRecord]) -> ThreatSummary {
    compute_summary_on(records, Local::now().date_naive())
}

/// Same as `compute_summary` with "today" fixed by the caller
pub fn compute_summary_on(records: &[ThreatRecord], today: NaiveDate) -> ThreatSummary {
    let mut summary = ThreatSummary {
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        match record.severity {
            Some(Severity::Critical) => summary.critical += 1,
            Some(Severity::High) => summary.high += 1,
            Some(Severity::Medium) => summary.medium += 1,
            Some(Severity::Low) => summary.low += 1,
            _ => {}
        }

        match record.status {
            Some(ThreatStatus::Investigating) => summary.investigation_pending += 1,
            Some(ThreatStatus::Resolved) => summary.resolved += 1,
            _ => {}
        }

        if record.detected_on(today) {
            summary.new_today += 1;
        }

        if record.is_active_threat() {
            summary.active += 1;
        }
    }

    summary
}

// ============================================================================
// TYPE DISTRIBUTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub name: String,
    pub count: usize,
    /// Share of all records, 0-100
    pub percentage: f64,
}

/// Count per classification label, in order of first appearance
pub fn group_by_type(records: &[ThreatRecord]) -> Vec<TypeCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<TypeCount> = Vec::new();

    for record in records {
        let name = record.type_label();
        match index.get(name) {
            Some(&i) => groups[i].count += 1,
            None => {
                index.insert(name, groups.len());
                groups.push(TypeCount {
                    name: name.to_string(),
                    count: 1,
                    percentage: 0.0,
                });
            }
        }
    }

    let total = records.len();
    for group in &mut groups {
        group.percentage = share(group.count, total);
    }

    groups
}

/// `count / total` as a percentage, 0 when `total` is 0
pub fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

// ============================================================================
// RECENT ACTIVITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub id: ThreatId,
    /// Local `HH:MM`, or "Unknown"
    pub display_time: String,
    pub event_text: String,
    pub severity: String,
    pub tone: Tone,
}

/// Newest `limit` records, newest first. Ties keep backend order and
/// records without a usable timestamp sort last.
pub fn recent_timeline(records: &[ThreatRecord], limit: usize) -> Vec<TimelineEntry> {
    let mut ordered: Vec<&ThreatRecord> = records.iter().collect();
    ordered.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    ordered
        .into_iter()
        .take(limit)
        .map(|record| TimelineEntry {
            id: record.id.clone(),
            display_time: record.display_time(),
            event_text: format!("{} detected on {}", record.type_label(), record.target_label()),
            severity: record.severity_label().to_string(),
            tone: record.severity_tone(),
        })
        .collect()
}
