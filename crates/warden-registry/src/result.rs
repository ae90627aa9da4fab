// result.rs — Structured capability execution results.
//
// Execution never throws past the registry boundary: every outcome, including
// timeouts and implementation panics, becomes a CapabilityResult. Failures
// carry a FailureKind so callers can branch without parsing error strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Why an execution failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No capability registered under the requested name.
    NotFound,
    /// A declared dependency name does not resolve to a registered capability.
    DependencyUnsatisfied,
    /// The implementation's parameter validator rejected the parameters.
    ValidationFailed,
    /// The implementation ran past the descriptor's timeout. Best-effort:
    /// only the wait is abandoned, side effects may continue.
    Timeout,
    /// The implementation returned an error or panicked.
    ExecutionFailed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "not_found"),
            FailureKind::DependencyUnsatisfied => write!(f, "dependency_unsatisfied"),
            FailureKind::ValidationFailed => write!(f, "validation_failed"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::ExecutionFailed => write!(f, "execution_failed"),
        }
    }
}

/// The outcome of one capability execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityResult {
    /// Whether the execution succeeded.
    pub success: bool,

    /// Implementation output on success.
    pub output: Option<String>,

    /// Error description on failure.
    pub error: Option<String>,

    /// Structured failure classification; None on success.
    pub failure_kind: Option<FailureKind>,

    /// Free-form implementation metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Measured wall-clock duration in seconds. Stamped by the registry.
    #[serde(default)]
    pub execution_time: f64,
}

impl CapabilityResult {
    /// A successful result with the given output.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
            failure_kind: None,
            metadata: Map::new(),
            execution_time: 0.0,
        }
    }

    /// A classified failure with the given error text.
    pub fn failure(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            failure_kind: Some(kind),
            metadata: Map::new(),
            execution_time: 0.0,
        }
    }

    /// Attach a metadata entry and return self.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
