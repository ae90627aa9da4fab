// audit.rs — Append-only audit log entries and their read-side filter.
//
// Every authorization decision and execution outcome is recorded here.
// Entries are append-only: nothing edits or removes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use warden_types::RiskLevel;

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// When the action happened (UTC).
    pub timestamp: DateTime<Utc>,
    /// Which actor performed the action.
    pub user_id: String,
    /// What was done (e.g., "tool.execute", "workflow.create").
    pub action: String,
    /// Arbitrary structured details.
    pub details: Value,
    /// Risk level assessed for the action.
    pub risk_level: RiskLevel,
    /// Outcome (e.g., "allowed", "denied", "completed").
    pub status: String,
}

/// Read-side filter for the audit log. A default filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    /// Only entries at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only entries at or before this instant.
    pub until: Option<DateTime<Utc>>,
    /// Only entries for this actor.
    pub user_id: Option<String>,
    /// Only entries with this exact action string.
    pub action: Option<String>,
}

impl AuditLogFilter {
    pub(crate) fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.timestamp > until {
                return false;
            }
        }
        if let Some(ref user_id) = self.user_id {
            if &entry.user_id != user_id {
                return false;
            }
        }
        if let Some(ref action) = self.action {
            if &entry.action != action {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(user: &str, action: &str) -> AuditLogEntry {
        AuditLogEntry {
            timestamp: Utc::now(),
            user_id: user.to_string(),
            action: action.to_string(),
            details: json!({"target": "fs://workspace/a.txt"}),
            risk_level: RiskLevel::Low,
            status: "allowed".to_string(),
        }
    }

    #[test]
    fn filter_by_user_and_action() {
        let e = entry("user-1", "tool.execute");

        let by_user = AuditLogFilter {
            user_id: Some("user-2".to_string()),
            ..Default::default()
        };
        assert!(!by_user.matches(&e));

        let by_action = AuditLogFilter {
            action: Some("tool.execute".to_string()),
            ..Default::default()
        };
        assert!(by_action.matches(&e));
    }

    #[test]
    fn serialization_round_trip() {
        let e = entry("user-1", "workflow.create");
        let json = serde_json::to_string(&e).unwrap();
        let restored: AuditLogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.user_id, "user-1");
        assert_eq!(restored.action, "workflow.create");
        assert_eq!(restored.status, "allowed");
    }
}
