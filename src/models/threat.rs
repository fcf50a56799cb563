//! Threat record model
//!
//! The backend speaks two dialects: dashboard producers send `type` /
//! `severity`, the prediction service sends `prediction` / `threat_level`
//! plus model output. Everything is parsed into `RawThreatRecord` and
//! normalized once into `ThreatRecord`; nothing downstream looks at aliases.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::UNKNOWN_LABEL;

// ============================================================================
// IDENTIFIER
// ============================================================================

/// Record identifier, integer or string depending on the producer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThreatId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ThreatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatId::Int(n) => write!(f, "{}", n),
            ThreatId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ThreatId {
    fn from(n: i64) -> Self {
        ThreatId::Int(n)
    }
}

impl From<&str> for ThreatId {
    fn from(s: &str) -> Self {
        ThreatId::Text(s.to_string())
    }
}

impl From<String> for ThreatId {
    fn from(s: String) -> Self {
        ThreatId::Text(s)
    }
}

impl FromStr for ThreatId {
    type Err = std::convert::Infallible;

    /// Numeric input becomes `Int`, anything else `Text`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(ThreatId::Int)
            .unwrap_or_else(|_| ThreatId::Text(s.to_string())))
    }
}

// ============================================================================
// DISPLAY TONE
// ============================================================================

/// Badge color family used by views for severity and status labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Red,
    Orange,
    Yellow,
    Blue,
    Green,
    Gray,
    /// Missing or unrecognized label
    Neutral,
}

impl Tone {
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Red => "#ef4444",
            Tone::Orange => "#f97316",
            Tone::Yellow => "#eab308",
            Tone::Blue => "#3b82f6",
            Tone::Green => "#10b981",
            Tone::Gray => "#6b7280",
            Tone::Neutral => "#9ca3af",
        }
    }
}

// ============================================================================
// SEVERITY
// ============================================================================

/// Impact ranking, Critical > High > Medium > Low
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    /// Label outside the known set, kept verbatim for display
    Other(String),
}

impl Severity {
    /// Case-insensitive parse; never fails
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Other(label) => label,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Other(_) => 0,
        }
    }

    /// Critical or High
    pub fn is_urgent(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    pub fn tone(&self) -> Tone {
        match self {
            Severity::Critical => Tone::Red,
            Severity::High => Tone::Orange,
            Severity::Medium => Tone::Yellow,
            Severity::Low => Tone::Blue,
            Severity::Other(_) => Tone::Neutral,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        Severity::parse(&label)
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

// ============================================================================
// STATUS
// ============================================================================

/// Lifecycle stage of a threat
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThreatStatus {
    Active,
    Investigating,
    /// Only ever set by external data
    Contained,
    Resolved,
    Other(String),
}

impl ThreatStatus {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "active" => ThreatStatus::Active,
            "investigating" => ThreatStatus::Investigating,
            "contained" => ThreatStatus::Contained,
            "resolved" => ThreatStatus::Resolved,
            _ => ThreatStatus::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ThreatStatus::Active => "Active",
            ThreatStatus::Investigating => "Investigating",
            ThreatStatus::Contained => "Contained",
            ThreatStatus::Resolved => "Resolved",
            ThreatStatus::Other(label) => label,
        }
    }

    /// Active or Investigating
    pub fn is_open(&self) -> bool {
        matches!(self, ThreatStatus::Active | ThreatStatus::Investigating)
    }

    pub fn tone(&self) -> Tone {
        match self {
            ThreatStatus::Active => Tone::Red,
            ThreatStatus::Investigating => Tone::Orange,
            ThreatStatus::Contained => Tone::Green,
            ThreatStatus::Resolved => Tone::Gray,
            ThreatStatus::Other(_) => Tone::Neutral,
        }
    }
}

impl fmt::Display for ThreatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for ThreatStatus {
    fn from(label: String) -> Self {
        ThreatStatus::parse(&label)
    }
}

impl From<ThreatStatus> for String {
    fn from(status: ThreatStatus) -> Self {
        status.as_str().to_string()
    }
}

// ============================================================================
// MODEL ANALYSIS
// ============================================================================

/// Classifier output attached by the prediction service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelAnalysis {
    #[serde(default)]
    pub class_probabilities: BTreeMap<String, f64>,
    pub anomaly_score: Option<f64>,
    pub is_anomaly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<FeatureExplanation>,
}

impl ModelAnalysis {
    /// Most probable class, if the producer sent probabilities
    pub fn top_class(&self) -> Option<(&str, f64)> {
        self.class_probabilities
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, p)| (name.as_str(), *p))
    }
}

/// Feature attribution for a prediction. Models without importances send
/// only `message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureExplanation {
    #[serde(default, deserialize_with = "lenient")]
    pub top_features: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub importance_values: Option<Vec<f64>>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
}

impl FeatureExplanation {
    /// Features paired with their importance, most important first
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let (Some(features), Some(values)) = (&self.top_features, &self.importance_values) else {
            return Vec::new();
        };

        let mut ranked: Vec<(&str, f64)> = features
            .iter()
            .map(String::as_str)
            .zip(values.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

// ============================================================================
// DETAIL ATTACHMENTS
// ============================================================================

/// Producer-supplied event in a threat's own timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub at: Option<DateTime<Utc>>,
    pub description: String,
}

/// Host touched by a threat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffectedSystem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    /// `server`, `endpoint`, `network`, ...
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
}

// ============================================================================
// THREAT RECORD
// ============================================================================

/// One detected security event, aliases resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub id: ThreatId,
    #[serde(rename = "type")]
    pub threat_type: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<ThreatStatus>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ModelAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation_steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_systems: Option<Vec<AffectedSystem>>,
}

impl ThreatRecord {
    /// Bare record with only an id; used by tests and seed data
    pub fn new(id: impl Into<ThreatId>) -> Self {
        Self {
            id: id.into(),
            threat_type: None,
            severity: None,
            status: None,
            source: None,
            target: None,
            timestamp: None,
            details: None,
            analysis: None,
            mitigation_steps: None,
            timeline: None,
            affected_systems: None,
        }
    }

    pub fn type_label(&self) -> &str {
        self.threat_type.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn severity_label(&self) -> &str {
        self.severity.as_ref().map(Severity::as_str).unwrap_or(UNKNOWN_LABEL)
    }

    pub fn status_label(&self) -> &str {
        self.status.as_ref().map(ThreatStatus::as_str).unwrap_or(UNKNOWN_LABEL)
    }

    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn target_label(&self) -> &str {
        self.target.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn severity_tone(&self) -> Tone {
        self.severity.as_ref().map(Severity::tone).unwrap_or(Tone::Neutral)
    }

    pub fn status_tone(&self) -> Tone {
        self.status.as_ref().map(ThreatStatus::tone).unwrap_or(Tone::Neutral)
    }

    pub fn has_status(&self, status: &ThreatStatus) -> bool {
        self.status.as_ref() == Some(status)
    }

    pub fn has_severity(&self, severity: &Severity) -> bool {
        self.severity.as_ref() == Some(severity)
    }

    /// Active or Investigating, regardless of severity
    pub fn is_open(&self) -> bool {
        self.status.as_ref().is_some_and(ThreatStatus::is_open)
    }

    /// Open and Critical/High: the operationally urgent subset
    pub fn is_active_threat(&self) -> bool {
        self.is_open() && self.severity.as_ref().is_some_and(Severity::is_urgent)
    }

    /// Detection time falls on `day` in local time
    pub fn detected_on(&self, day: NaiveDate) -> bool {
        self.timestamp
            .map(|ts| ts.with_timezone(&Local).date_naive() == day)
            .unwrap_or(false)
    }

    /// Local wall-clock `HH:MM`, or "Unknown"
    pub fn display_time(&self) -> String {
        self.timestamp
            .map(|ts| ts.with_timezone(&Local).format("%H:%M").to_string())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    /// Local date and time, or "Unknown"
    pub fn display_datetime(&self) -> String {
        self.timestamp
            .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

/// Alert as sent by the backend, before alias resolution.
///
/// Only `id` is strict. Every other field tolerates an off-type value by
/// reading it as absent, so one bad field never drops the record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawThreatRecord {
    pub id: ThreatId,
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub threat_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub prediction: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub threat_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub target: Option<String>,
    /// ISO string, or epoch milliseconds
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub class_probabilities: Option<BTreeMap<String, f64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub anomaly_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_anomaly: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub explanation: Option<FeatureExplanation>,
    #[serde(alias = "mitigationSteps", default, deserialize_with = "lenient")]
    pub mitigation_steps: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub timeline: Option<Vec<RawTimelineEvent>>,
    #[serde(alias = "affectedSystems", default, deserialize_with = "lenient")]
    pub affected_systems: Option<Vec<AffectedSystem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTimelineEvent {
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

impl RawThreatRecord {
    pub fn normalize(self) -> ThreatRecord {
        let threat_type = non_empty(self.threat_type).or_else(|| non_empty(self.prediction));

        let severity = non_empty(self.severity)
            .or_else(|| non_empty(self.threat_level).map(|level| capitalize(&level)))
            .map(|label| Severity::parse(&label));

        let analysis = if self.class_probabilities.is_some()
            || self.anomaly_score.is_some()
            || self.is_anomaly.is_some()
            || self.explanation.is_some()
        {
            Some(ModelAnalysis {
                class_probabilities: self.class_probabilities.unwrap_or_default(),
                anomaly_score: self.anomaly_score,
                is_anomaly: self.is_anomaly,
                explanation: self.explanation,
            })
        } else {
            None
        };

        let timeline = self
            .timeline
            .map(|events| {
                events
                    .into_iter()
                    .map(|event| TimelineEvent {
                        at: event.timestamp.as_ref().and_then(parse_timestamp_value),
                        description: non_empty(event.description)
                            .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|events| !events.is_empty());

        ThreatRecord {
            id: self.id,
            threat_type,
            severity,
            status: non_empty(self.status).map(|label| ThreatStatus::parse(&label)),
            source: non_empty(self.source),
            target: non_empty(self.target),
            timestamp: self.timestamp.as_ref().and_then(parse_timestamp_value),
            details: non_empty(self.details),
            analysis,
            mitigation_steps: self.mitigation_steps.filter(|steps| !steps.is_empty()),
            timeline,
            affected_systems: self.affected_systems.filter(|systems| !systems.is_empty()),
        }
    }
}

/// Body of `PATCH /threats/{id}/status`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateStatusRequest {
    pub status: ThreatStatus,
}

/// Any value `T` accepts, else `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Strings as-is, numbers and booleans in their textual form, else `None`
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_timestamp_value(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => parse_timestamp(s),
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// RFC 3339 or ISO with offset, naive date-time in local time, or a bare
/// date (UTC midnight)
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc));
    }

    // `Z` is spelled out so every offset format sees a numeric offset
    let with_offset = match input.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{}+00:00", rest),
        None => input.to_string(),
    };
    const OFFSET_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z", "%Y-%m-%d %H:%M:%S%.f%#z"];
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(&with_offset, format) {
            return Some(ts.with_timezone(&Utc));
        }
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|ts| ts.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawThreatRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_id_accepts_int_and_string() {
        assert_eq!(raw(json!({"id": 1})).id, ThreatId::Int(1));
        assert_eq!(raw(json!({"id": "THR-001"})).id, ThreatId::Text("THR-001".into()));
        assert_eq!("42".parse::<ThreatId>().unwrap(), ThreatId::Int(42));
        assert_eq!("abc".parse::<ThreatId>().unwrap(), ThreatId::Text("abc".into()));
    }

    #[test]
    fn test_type_prefers_type_over_prediction() {
        let rec = raw(json!({"id": 1, "type": "Malware", "prediction": "dos"})).normalize();
        assert_eq!(rec.type_label(), "Malware");

        let rec = raw(json!({"id": 2, "type": "", "prediction": "dos"})).normalize();
        assert_eq!(rec.type_label(), "dos");

        let rec = raw(json!({"id": 3})).normalize();
        assert_eq!(rec.type_label(), "Unknown");
    }

    #[test]
    fn test_threat_level_alias_is_capitalized() {
        let rec = raw(json!({"id": 1, "threat_level": "critical"})).normalize();
        assert_eq!(rec.severity, Some(Severity::Critical));
        assert_eq!(rec.severity_label(), "Critical");

        let rec = raw(json!({"id": 2, "threat_level": "unknown"})).normalize();
        assert_eq!(rec.severity, Some(Severity::Other("Unknown".into())));
        assert_eq!(rec.severity_tone(), Tone::Neutral);

        let rec = raw(json!({"id": 3, "severity": "High", "threat_level": "low"})).normalize();
        assert_eq!(rec.severity, Some(Severity::High));
    }

    #[test]
    fn test_severity_and_status_are_case_insensitive() {
        let rec = raw(json!({"id": 1, "severity": "hIgH", "status": "INVESTIGATING"})).normalize();
        assert_eq!(rec.severity, Some(Severity::High));
        assert_eq!(rec.status, Some(ThreatStatus::Investigating));
        assert!(rec.is_active_threat());
    }

    #[test]
    fn test_unrecognized_status_is_neutral_not_error() {
        let rec = raw(json!({"id": 1, "status": "Escalated", "severity": "Critical"})).normalize();
        assert_eq!(rec.status_label(), "Escalated");
        assert_eq!(rec.status_tone(), Tone::Neutral);
        assert!(!rec.is_open());
        assert!(!rec.is_active_threat());
    }

    #[test]
    fn test_missing_status_displays_unknown() {
        let rec = raw(json!({"id": 1, "severity": "Critical"})).normalize();
        assert_eq!(rec.status_label(), "Unknown");
        assert!(!rec.is_active_threat());
    }

    #[test]
    fn test_timestamp_formats() {
        let utc = parse_timestamp("2025-05-18T10:00:00Z").unwrap();
        assert_eq!(utc.hour(), 10);

        let naive = parse_timestamp("2025-05-18T10:23:15").unwrap();
        assert_eq!(naive.with_timezone(&Local).hour(), 10);
        assert_eq!(naive.with_timezone(&Local).minute(), 23);

        assert!(parse_timestamp("2025-05-18 10:23:15.123").is_some());
        assert!(parse_timestamp("2025-05-18").is_some());
        assert!(parse_timestamp("yesterday").is_none());

        let rec = raw(json!({"id": 1, "timestamp": 1_747_562_400_000_i64})).normalize();
        assert_eq!(rec.timestamp, DateTime::from_timestamp_millis(1_747_562_400_000));
    }

    #[test]
    fn test_timestamp_offset_forms() {
        let expected = parse_timestamp("2025-05-18T10:00:00Z");
        assert!(expected.is_some());

        assert_eq!(parse_timestamp("2025-05-18T10:00Z"), expected);
        assert_eq!(parse_timestamp("2025-05-18T10:00:00+0000"), expected);
        assert_eq!(parse_timestamp("2025-05-18T12:00:00+0200"), expected);
        assert_eq!(parse_timestamp("2025-05-18T05:00-05:00"), expected);
        assert_eq!(parse_timestamp("2025-05-18 10:00:00.000+00:00"), expected);
    }

    #[test]
    fn test_bare_date_is_utc_midnight() {
        let ts = parse_timestamp("2025-05-18").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 5, 18, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_off_type_fields_keep_the_record() {
        let rec = raw(json!({"id": 1, "severity": 3, "type": "Worm"})).normalize();
        assert_eq!(rec.severity, Some(Severity::Other("3".into())));
        assert_eq!(rec.severity_tone(), Tone::Neutral);

        let rec = raw(json!({"id": 2, "source": 42, "target": null, "details": {"x": 1}})).normalize();
        assert_eq!(rec.source_label(), "42");
        assert_eq!(rec.target_label(), "Unknown");
        assert!(rec.details.is_none());

        let rec = raw(json!({"id": 3, "anomaly_score": "n/a", "is_anomaly": "yes"})).normalize();
        assert!(rec.analysis.is_none());

        let rec = raw(json!({"id": 4, "mitigationSteps": "reboot", "timeline": 7, "affectedSystems": {}})).normalize();
        assert!(rec.mitigation_steps.is_none());
        assert!(rec.timeline.is_none());
        assert!(rec.affected_systems.is_none());
    }

    #[test]
    fn test_invalid_id_is_still_rejected() {
        assert!(serde_json::from_value::<RawThreatRecord>(json!({"type": "Worm"})).is_err());
        assert!(serde_json::from_value::<RawThreatRecord>(json!({"id": [1]})).is_err());
    }

    #[test]
    fn test_producer_timeline_and_systems() {
        let rec = raw(json!({
            "id": 1,
            "timeline": [
                {"timestamp": "2025-05-17T23:42:18Z", "description": "Initial detection"},
                {"timestamp": "whenever", "description": "Alert generated"}
            ],
            "affectedSystems": [
                {"name": "Web Server 01", "type": "server", "ip": "192.168.1.100", "status": "Isolated"},
                {"name": "Printer", "ip": 17}
            ]
        }))
        .normalize();

        let timeline = rec.timeline.unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].at, parse_timestamp("2025-05-17T23:42:18Z"));
        assert_eq!(timeline[0].description, "Initial detection");
        assert!(timeline[1].at.is_none());

        let systems = rec.affected_systems.unwrap();
        assert_eq!(systems[0].kind.as_deref(), Some("server"));
        assert_eq!(systems[1].ip.as_deref(), Some("17"));
        assert!(systems[1].status.is_none());

        let rec = raw(json!({"id": 2, "timeline": [], "affected_systems": []})).normalize();
        assert!(rec.timeline.is_none());
        assert!(rec.affected_systems.is_none());
    }

    #[test]
    fn test_explanation_ranked_by_importance() {
        let rec = raw(json!({
            "id": 1,
            "prediction": "dos",
            "explanation": {
                "top_features": ["feature_3", "feature_7", "feature_1"],
                "importance_values": [0.05, 0.31, 0.12]
            }
        }))
        .normalize();

        let explanation = rec.analysis.unwrap().explanation.unwrap();
        assert_eq!(
            explanation.ranked(),
            vec![("feature_7", 0.31), ("feature_1", 0.12), ("feature_3", 0.05)]
        );

        let rec = raw(json!({
            "id": 2,
            "explanation": {"message": "Feature importance not available for this model"}
        }))
        .normalize();
        let explanation = rec.analysis.unwrap().explanation.unwrap();
        assert!(explanation.ranked().is_empty());
        assert!(explanation.message.is_some());
    }

    #[test]
    fn test_unparseable_timestamp_displays_unknown() {
        let rec = raw(json!({"id": 1, "timestamp": "not a date"})).normalize();
        assert!(rec.timestamp.is_none());
        assert_eq!(rec.display_time(), "Unknown");
    }

    #[test]
    fn test_analysis_only_when_present() {
        let rec = raw(json!({"id": 1, "type": "Malware"})).normalize();
        assert!(rec.analysis.is_none());

        let rec = raw(json!({
            "id": 2,
            "prediction": "dos",
            "threat_level": "high",
            "class_probabilities": {"dos": 0.9, "normal": 0.1},
            "anomaly_score": -0.2,
            "is_anomaly": true
        }))
        .normalize();
        let analysis = rec.analysis.unwrap();
        assert_eq!(analysis.top_class(), Some(("dos", 0.9)));
        assert_eq!(analysis.is_anomaly, Some(true));
    }

    #[test]
    fn test_status_serializes_as_label() {
        let body = serde_json::to_value(UpdateStatusRequest { status: ThreatStatus::Investigating }).unwrap();
        assert_eq!(body, json!({"status": "Investigating"}));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical.rank() > Severity::High.rank());
        assert!(Severity::High.rank() > Severity::Medium.rank());
        assert!(Severity::Medium.rank() > Severity::Low.rank());
        assert_eq!(Severity::Other("x".into()).rank(), 0);
    }
}
