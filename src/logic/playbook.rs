//! Threat detail derivations: remediation playbooks and attack phases.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{AffectedSystem, ThreatRecord, Tone};

// ============================================================================
// MITIGATION
// ============================================================================

const MALWARE_STEPS: [&str; 4] = [
    "Isolate affected systems from the network",
    "Update antivirus definitions and run full system scan",
    "Investigate entry point and patch vulnerabilities",
    "Restore from clean backup if available",
];

const BRUTE_FORCE_STEPS: [&str; 4] = [
    "Lock affected accounts temporarily",
    "Implement account lockout policies",
    "Enforce stronger password requirements",
    "Enable multi-factor authentication",
];

const EXFILTRATION_STEPS: [&str; 4] = [
    "Block identified malicious connections",
    "Revoke compromised credentials",
    "Audit data access permissions",
    "Implement data loss prevention controls",
];

const GENERIC_STEPS: [&str; 4] = [
    "Isolate affected systems",
    "Investigate root cause",
    "Apply security patches",
    "Monitor for continued suspicious activity",
];

/// Built-in steps for a classification label. An unclassified record gets
/// the malware playbook.
pub fn playbook_for(threat_type: Option<&str>) -> &'static [&'static str] {
    match threat_type.map(|t| t.trim().to_lowercase()).as_deref() {
        None | Some("malware") => &MALWARE_STEPS,
        Some("brute force") => &BRUTE_FORCE_STEPS,
        Some("data exfiltration") => &EXFILTRATION_STEPS,
        Some(_) => &GENERIC_STEPS,
    }
}

/// Producer-supplied steps win over the built-in playbook
pub fn mitigation_steps(record: &ThreatRecord) -> Vec<String> {
    match &record.mitigation_steps {
        Some(steps) => steps.clone(),
        None => playbook_for(record.threat_type.as_deref())
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

// ============================================================================
// ATTACK PHASES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentPhase {
    /// Set on reconstructed phases; producer events carry only a description
    pub title: Option<&'static str>,
    /// `None` when the record has no usable timestamp
    pub at: Option<DateTime<Utc>>,
    pub description: String,
    pub tone: Tone,
}

/// The producer's own timeline when it sent one. Otherwise a reconstructed
/// kill chain ending at the detection time: initial access 20 minutes
/// before, lateral movement 10 minutes before.
pub fn incident_phases(record: &ThreatRecord) -> Vec<IncidentPhase> {
    if let Some(events) = &record.timeline {
        return events
            .iter()
            .map(|event| IncidentPhase {
                title: None,
                at: event.at,
                description: event.description.clone(),
                tone: Tone::Blue,
            })
            .collect();
    }

    let offset = |minutes: i64| record.timestamp.map(|ts| ts - Duration::minutes(minutes));

    vec![
        IncidentPhase {
            title: Some("Initial Access Detected"),
            at: offset(20),
            description: "Exploit attempt detected against vulnerable web application".to_string(),
            tone: Tone::Red,
        },
        IncidentPhase {
            title: Some("Lateral Movement"),
            at: offset(10),
            description: "Suspicious authentication to multiple systems detected".to_string(),
            tone: Tone::Orange,
        },
        IncidentPhase {
            title: Some("Malicious Activity"),
            at: record.timestamp,
            description: record
                .details
                .clone()
                .unwrap_or_else(|| format!("{} activity on {}", record.type_label(), record.target_label())),
            tone: Tone::Red,
        },
    ]
}

// ============================================================================
// AFFECTED SYSTEMS
// ============================================================================

/// Systems the producer listed, else the record's own target as the one
/// known host
pub fn affected_systems(record: &ThreatRecord) -> Vec<AffectedSystem> {
    match &record.affected_systems {
        Some(systems) => systems.clone(),
        None => vec![AffectedSystem {
            name: record.target.clone(),
            ..Default::default()
        }],
    }
}
