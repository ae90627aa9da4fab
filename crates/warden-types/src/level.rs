// level.rs — The ordinal risk level shared across the core.
//
// Every descriptor, policy, threat pattern, and audit entry carries one of
// these three values. The derived `Ord` gives Low < Medium < High, which is
// what callers use to compare a scored operation against an actor's ceiling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordinal risk level: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}
