// context.rs — Per-actor security context.
//
// One context exists per authenticated actor. Re-creating a context for the
// same user replaces the prior one wholesale — there is no merge and no
// background expiry. Mutation goes through the typed setters below rather
// than free-form field rewriting, so every change path is enumerable.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_types::RiskLevel;

/// The security context for one authenticated actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityContext {
    /// The actor this context belongs to.
    pub user_id: String,

    /// Role names assigned to the actor.
    pub roles: Vec<String>,

    /// Permission strings the actor holds. Checked by exact match.
    pub permissions: HashSet<String>,

    /// The actor's current trust/risk ceiling.
    pub risk_level: RiskLevel,

    /// Whether this context is active. Inactive contexts still exist but
    /// should not authorize anything.
    pub is_active: bool,

    /// When the actor last did something through this context.
    pub last_activity: DateTime<Utc>,

    /// Optional transport-issued session identifier.
    pub session_id: Option<String>,
}

impl SecurityContext {
    /// Create a fresh, active context at Low risk with the given grants.
    pub fn new(
        user_id: impl Into<String>,
        roles: Vec<String>,
        permissions: HashSet<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
            permissions,
            risk_level: RiskLevel::Low,
            is_active: true,
            last_activity: Utc::now(),
            session_id: None,
        }
    }

    /// Check that every required permission string is present (exact match).
    pub fn has_permissions(&self, required: &[&str]) -> bool {
        required.iter().all(|perm| self.permissions.contains(*perm))
    }

    /// Raise or lower the actor's risk ceiling.
    pub fn set_risk_level(&mut self, level: RiskLevel) {
        self.risk_level = level;
    }

    /// Activate or deactivate the context.
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Attach a session identifier.
    pub fn set_session(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    /// Bump `last_activity` to now.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
