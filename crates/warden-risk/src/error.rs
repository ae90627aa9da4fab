// error.rs — Error types for the risk gate.
//
// Only registration-time misuse is an error. Evaluation paths
// (evaluate_risk, detect_threats, assess_risk, the log readers) never
// return Err to their callers.

use thiserror::Error;

/// Errors that can occur while configuring the risk gate.
#[derive(Debug, Error)]
pub enum RiskError {
    /// A policy or threat pattern carries a regex that does not compile.
    #[error("invalid regex '{pattern}' in '{name}': {reason}")]
    InvalidPattern {
        name: String,
        pattern: String,
        reason: String,
    },

    /// Threat patterns are immutable once registered; re-registration is refused.
    #[error("threat pattern '{0}' is already registered")]
    DuplicatePattern(String),

    /// Gate configuration failed validation.
    #[error("invalid gate configuration: {0}")]
    InvalidConfig(String),
}
