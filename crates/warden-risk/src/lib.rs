//! # warden-risk
//!
//! The risk gate for Warden: authorization and threat screening for
//! capability invocations.
//!
//! The [`RiskGate`] is a long-lived service object that owns security
//! policies, threat patterns, per-actor [`SecurityContext`]s, the append-only
//! threat-event and audit logs, and the circuit-breaker set of blocked
//! pattern names. Callers consult it before (permission + risk) and after
//! (audit) every capability execution.
//!
//! ## Key invariants
//!
//! - **First match wins**: `evaluate_risk` consults policies in registration
//!   order and returns on the first command-pattern match — the tie-break is
//!   order, not severity.
//! - **Circuit breaker**: a HIGH-severity threat match blocks its pattern;
//!   blocked patterns are skipped entirely until explicitly unblocked.
//! - **Append-only logs**: threat events and audit entries are never edited;
//!   the threat log supports one explicit clear operation, nothing else.
//! - **No throws**: evaluation paths never return `Err` — only registration
//!   can fail ([`RiskError`]).

pub mod audit;
pub mod context;
pub mod error;
pub mod gate;
pub mod policy;
pub mod sanitize;
pub mod threat;

pub use audit::{AuditLogEntry, AuditLogFilter};
pub use context::SecurityContext;
pub use error::RiskError;
pub use gate::{GateConfig, RiskGate};
pub use warden_types::RiskLevel;
pub use policy::SecurityPolicy;
pub use sanitize::sanitize_command;
pub use threat::{ThreatDetails, ThreatEvent, ThreatEventFilter, ThreatPattern, ThreatStatistics};
