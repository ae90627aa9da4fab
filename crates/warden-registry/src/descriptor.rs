// descriptor.rs — Capability descriptor metadata.
//
// A descriptor is the registry-facing contract of a capability: name,
// category, declared risk level, dependency names, parameter schema, and the
// execution timeout. The registry stores descriptors verbatim and never
// inspects the parameter schema itself — validation is the implementation's
// job.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use warden_types::RiskLevel;

/// Default execution timeout when a descriptor does not declare one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// What kind of side effects a capability has.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityCategory {
    File,
    Code,
    Browser,
    System,
}

impl fmt::Display for CapabilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityCategory::File => write!(f, "file"),
            CapabilityCategory::Code => write!(f, "code"),
            CapabilityCategory::Browser => write!(f, "browser"),
            CapabilityCategory::System => write!(f, "system"),
        }
    }
}

/// The registry-facing metadata for one capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Unique capability name. Re-registering a name overwrites.
    pub name: String,

    /// Human-readable description.
    pub description: String,

    /// Side-effect category, also the key for rollback strategies.
    pub category: CapabilityCategory,

    /// Implementation version string.
    pub version: String,

    /// Who maintains this capability.
    pub author: String,

    /// Declared risk level of invoking this capability.
    pub risk_level: RiskLevel,

    /// Operating systems the implementation supports.
    pub os_compatibility: Vec<String>,

    /// Names of other capabilities this one needs present at execution time.
    /// Presence is all the registry checks — dependencies are expected to be
    /// leaves, not call chains.
    pub dependencies: Vec<String>,

    /// JSON schema (or free-form description) of accepted parameters.
    pub parameters: Value,

    /// Wall-clock execution bound, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl CapabilityDescriptor {
    /// Create a descriptor with sensible defaults: Low risk, no
    /// dependencies, the default timeout.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: CapabilityCategory,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category,
            version: "0.1.0".to_string(),
            author: String::new(),
            risk_level: RiskLevel::Low,
            os_compatibility: Vec::new(),
            dependencies: Vec::new(),
            parameters: Value::Object(serde_json::Map::new()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the declared risk level and return self.
    pub fn with_risk_level(mut self, level: RiskLevel) -> Self {
        self.risk_level = level;
        self
    }

    /// Set the dependency names and return self.
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Set the execution timeout and return self.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the parameter schema and return self.
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_descriptor_defaults() {
        let d = CapabilityDescriptor::new("file_read", "read a file", CapabilityCategory::File);
        assert_eq!(d.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(d.risk_level, RiskLevel::Low);
        assert!(d.dependencies.is_empty());
    }

    #[test]
    fn builder_methods_chain() {
        let d = CapabilityDescriptor::new("shell", "run a command", CapabilityCategory::System)
            .with_risk_level(RiskLevel::High)
            .with_dependencies(vec!["file_read".to_string()])
            .with_timeout_secs(60);
        assert_eq!(d.risk_level, RiskLevel::High);
        assert_eq!(d.dependencies, vec!["file_read"]);
        assert_eq!(d.timeout_secs, 60);
    }

    #[test]
    fn timeout_defaults_when_absent_from_json() {
        let json = r#"{
            "name": "x", "description": "", "category": "file",
            "version": "1.0", "author": "", "risk_level": "low",
            "os_compatibility": [], "dependencies": [], "parameters": {}
        }"#;
        let d: CapabilityDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn category_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&CapabilityCategory::Browser).unwrap(),
            "\"browser\""
        );
        assert_eq!(CapabilityCategory::System.to_string(), "system");
    }
}
