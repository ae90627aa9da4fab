// threat.rs — Threat patterns, events, and the read-side query types.
//
// A ThreatPattern is a named regex with a severity and a mitigation note.
// Patterns are immutable once registered. Every match appends a ThreatEvent
// to an append-only log; events are never edited, only cleared wholesale by
// an explicit operation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_types::RiskLevel;

/// A dangerous textual signature with an associated severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatPattern {
    /// Unique pattern name (e.g., "dangerous_file_operation").
    pub name: String,

    /// Human-readable description.
    pub description: String,

    /// The regex source, matched case-insensitively.
    pub pattern: String,

    /// Severity assigned to every event this pattern produces.
    pub risk_level: RiskLevel,

    /// Grouping category (e.g., "file_system", "network").
    pub category: String,

    /// What to do about a match — advisory text, not executed.
    pub mitigation: String,
}

/// What a pattern matched against, recorded on each event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatDetails {
    /// The scanned text.
    pub text: String,
    /// The regex source that matched.
    pub pattern: String,
    /// The matching pattern's category.
    pub category: String,
}

/// One detection — an append-only record, never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatEvent {
    /// When the detection happened (UTC).
    pub timestamp: DateTime<Utc>,
    /// Name of the pattern that fired.
    pub pattern_name: String,
    /// Severity inherited from the pattern.
    pub risk_level: RiskLevel,
    /// What was matched.
    pub details: ThreatDetails,
    /// Where the scanned text came from (caller-supplied label).
    pub source: String,
    /// Event status. Always starts as "detected".
    pub status: String,
}

impl ThreatEvent {
    pub(crate) fn new(pattern: &ThreatPattern, text: &str, source: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            pattern_name: pattern.name.clone(),
            risk_level: pattern.risk_level,
            details: ThreatDetails {
                text: text.to_string(),
                pattern: pattern.pattern.clone(),
                category: pattern.category.clone(),
            },
            source: source.to_string(),
            status: "detected".to_string(),
        }
    }
}

/// Read-side filter for the threat-event log. All fields optional; a
/// default filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ThreatEventFilter {
    /// Only events at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only events at or before this instant.
    pub until: Option<DateTime<Utc>>,
    /// Only events at exactly this severity.
    pub risk_level: Option<RiskLevel>,
    /// Only events whose pattern category matches.
    pub category: Option<String>,
}

impl ThreatEventFilter {
    pub(crate) fn matches(&self, event: &ThreatEvent) -> bool {
        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.timestamp > until {
                return false;
            }
        }
        if let Some(level) = self.risk_level {
            if event.risk_level != level {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if &event.details.category != category {
                return false;
            }
        }
        true
    }
}

/// Aggregate counts over the full threat-event log.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ThreatStatistics {
    pub total_events: usize,
    pub high_risk_events: usize,
    pub medium_risk_events: usize,
    pub low_risk_events: usize,
    /// How many patterns are currently circuit-breaker blocked.
    pub blocked_patterns: usize,
    /// Event counts per pattern category.
    pub categories: BTreeMap<String, usize>,
}
