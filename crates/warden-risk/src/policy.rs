// policy.rs — Security policy definitions.
//
// A policy names a risk level and a set of regex command patterns. Policies
// are evaluated in registration order and the first pattern match wins — the
// tie-break is deliberately order-based, not severity-based. If that ever
// changes it must change explicitly, not silently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use warden_types::RiskLevel;

/// A registered security policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPolicy {
    /// Unique policy name (e.g., "file_operation").
    pub name: String,

    /// Human-readable description.
    pub description: String,

    /// The risk level returned when one of this policy's patterns matches.
    pub risk_level: RiskLevel,

    /// Permission strings an actor needs for operations under this policy.
    pub required_permissions: Vec<String>,

    /// Wall-clock execution ceiling, in seconds, for governed operations.
    pub max_execution_time: u64,

    /// Free-form resource limits (e.g., {"max_memory": 536870912}).
    pub resource_limits: Map<String, Value>,

    /// Regex patterns matched case-insensitively against operation text.
    pub command_patterns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_round_trip() {
        let policy = SecurityPolicy {
            name: "file_operation".to_string(),
            description: "file operation policy".to_string(),
            risk_level: RiskLevel::Medium,
            required_permissions: vec!["file.read".to_string(), "file.write".to_string()],
            max_execution_time: 30,
            resource_limits: Map::new(),
            command_patterns: vec![r"rm\s+-rf\s+/".to_string()],
        };
        let json = serde_json::to_string(&policy).unwrap();
        let restored: SecurityPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.name, policy.name);
        assert_eq!(restored.risk_level, RiskLevel::Medium);
        assert_eq!(restored.command_patterns.len(), 1);
    }
}
