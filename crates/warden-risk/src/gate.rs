// gate.rs — The risk gate: policies, threat detection, contexts, audit.
//
// The gate is the authorization chokepoint for capability invocations. It is
// a long-lived service object constructed once at startup and shared by
// reference — no ambient singletons. Every mutable collection sits behind its
// own lock because the gate is reached from concurrent call paths; readers of
// the accumulated logs get snapshot copies.
//
// Evaluation paths never return Err. Only registration (bad regex, duplicate
// pattern name) can fail.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use tracing::{info, warn};

use crate::audit::{AuditLogEntry, AuditLogFilter};
use crate::context::SecurityContext;
use crate::error::RiskError;
use warden_types::RiskLevel;
use crate::policy::SecurityPolicy;
use crate::threat::{ThreatEvent, ThreatEventFilter, ThreatPattern, ThreatStatistics};

/// 512 MiB — the memory ceiling used by the parameter fallback check.
const MEMORY_LIMIT_BYTES: f64 = 512.0 * 1024.0 * 1024.0;

/// Parameter keys that force a HIGH evaluation regardless of operation text.
const SENSITIVE_PARAM_KEYS: &[&str] = &["password", "secret", "key"];

/// Substrings that mark a string parameter as shell-injection-shaped.
const SHELL_METACHARACTERS: &[&str] = &[";", "&&", "||", "`"];

/// Tunable gate configuration, validated at construction.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Score in [0, 1] above which `exceeds_threshold` reports true.
    pub risk_threshold: f64,
    /// Whether HIGH-risk audit entries also emit a warning-level signal.
    pub warn_on_high_risk: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            risk_threshold: 0.7,
            warn_on_high_risk: true,
        }
    }
}

impl GateConfig {
    /// Check the configuration invariants.
    pub fn validate(&self) -> Result<(), RiskError> {
        if !(0.0..=1.0).contains(&self.risk_threshold) {
            return Err(RiskError::InvalidConfig(format!(
                "risk_threshold must be within [0, 1], got {}",
                self.risk_threshold
            )));
        }
        Ok(())
    }
}

/// A policy with its command patterns compiled once at registration.
struct CompiledPolicy {
    policy: SecurityPolicy,
    patterns: Vec<Regex>,
}

/// A threat pattern with its regex compiled once at registration.
struct CompiledPattern {
    pattern: ThreatPattern,
    regex: Regex,
}

/// The risk gate service.
pub struct RiskGate {
    config: GateConfig,
    /// Registration-ordered — evaluation is first-match-wins in this order.
    policies: RwLock<Vec<CompiledPolicy>>,
    /// Registration-ordered threat patterns.
    patterns: RwLock<Vec<CompiledPattern>>,
    /// One context per actor; replaced wholesale on re-creation.
    contexts: RwLock<HashMap<String, SecurityContext>>,
    /// Circuit-breaker state: pattern names currently suppressed.
    blocked: RwLock<HashSet<String>>,
    /// Append-only detection log.
    threat_events: RwLock<Vec<ThreatEvent>>,
    /// Append-only audit log.
    audit_log: RwLock<Vec<AuditLogEntry>>,
}

impl RiskGate {
    /// Create an empty gate with the default configuration.
    pub fn new() -> Self {
        Self {
            config: GateConfig::default(),
            policies: RwLock::new(Vec::new()),
            patterns: RwLock::new(Vec::new()),
            contexts: RwLock::new(HashMap::new()),
            blocked: RwLock::new(HashSet::new()),
            threat_events: RwLock::new(Vec::new()),
            audit_log: RwLock::new(Vec::new()),
        }
    }

    /// Create an empty gate with a validated custom configuration.
    pub fn with_config(config: GateConfig) -> Result<Self, RiskError> {
        config.validate()?;
        let mut gate = Self::new();
        gate.config = config;
        Ok(gate)
    }

    /// Create a gate pre-seeded with the default rulebook: the stock
    /// `file_operation` and `system_command` policies and the four stock
    /// threat patterns.
    pub fn with_defaults() -> Self {
        let gate = Self::new();
        for policy in default_policies() {
            gate.register_policy(policy)
                .expect("default rulebook policies are valid");
        }
        for pattern in default_patterns() {
            gate.register_pattern(pattern)
                .expect("default rulebook patterns are valid");
        }
        gate
    }

    // ── Policies ──

    /// Register a security policy. Its command patterns are compiled now,
    /// case-insensitively; a pattern that does not compile rejects the whole
    /// policy. Re-registering a name replaces the policy in place, keeping
    /// its original evaluation position.
    pub fn register_policy(&self, policy: SecurityPolicy) -> Result<(), RiskError> {
        let patterns = policy
            .command_patterns
            .iter()
            .map(|source| compile_case_insensitive(source, &policy.name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut policies = self.policies.write();
        let compiled = CompiledPolicy { policy, patterns };
        if let Some(existing) = policies
            .iter_mut()
            .find(|p| p.policy.name == compiled.policy.name)
        {
            warn!(name = %compiled.policy.name, "policy already registered; replacing");
            *existing = compiled;
        } else {
            info!(name = %compiled.policy.name, "registered security policy");
            policies.push(compiled);
        }
        Ok(())
    }

    /// Look up a registered policy by name.
    pub fn policy(&self, name: &str) -> Option<SecurityPolicy> {
        self.policies
            .read()
            .iter()
            .find(|p| p.policy.name == name)
            .map(|p| p.policy.clone())
    }

    /// Evaluate the risk of an operation. Policies are consulted in
    /// registration order and the first command-pattern match wins,
    /// returning that policy's risk level immediately. If no policy
    /// matches, parameters are inspected: sensitive keys or an oversized
    /// `memory` request force HIGH; otherwise the operation is LOW.
    pub fn evaluate_risk(&self, operation: &str, params: &Value) -> RiskLevel {
        for compiled in self.policies.read().iter() {
            if compiled.patterns.iter().any(|re| re.is_match(operation)) {
                return compiled.policy.risk_level;
            }
        }

        if let Some(map) = params.as_object() {
            if SENSITIVE_PARAM_KEYS.iter().any(|key| map.contains_key(*key)) {
                return RiskLevel::High;
            }
            if let Some(memory) = map.get("memory").and_then(Value::as_f64) {
                if memory > MEMORY_LIMIT_BYTES {
                    return RiskLevel::High;
                }
            }
        }

        RiskLevel::Low
    }

    // ── Contexts & permissions ──

    /// Create (or wholesale replace) the security context for an actor.
    pub fn create_context(
        &self,
        user_id: impl Into<String>,
        roles: Vec<String>,
        permissions: HashSet<String>,
    ) -> SecurityContext {
        let context = SecurityContext::new(user_id, roles, permissions);
        info!(user_id = %context.user_id, "created security context");
        self.contexts
            .write()
            .insert(context.user_id.clone(), context.clone());
        context
    }

    /// Snapshot of an actor's context, if one exists.
    pub fn context(&self, user_id: &str) -> Option<SecurityContext> {
        self.contexts.read().get(user_id).cloned()
    }

    /// True iff the actor has a context holding every required permission
    /// string (exact match). No context means no permissions.
    pub fn check_permission(&self, user_id: &str, required: &[&str]) -> bool {
        match self.contexts.read().get(user_id) {
            Some(context) => context.has_permissions(required),
            None => false,
        }
    }

    /// Activate or deactivate an actor's context. Returns false if the
    /// actor has no context.
    pub fn set_context_active(&self, user_id: &str, active: bool) -> bool {
        self.with_context(user_id, |ctx| ctx.set_active(active))
    }

    /// Adjust an actor's risk ceiling. Returns false if the actor has no
    /// context.
    pub fn set_context_risk_level(&self, user_id: &str, level: RiskLevel) -> bool {
        self.with_context(user_id, |ctx| ctx.set_risk_level(level))
    }

    /// Attach a session id to an actor's context. Returns false if the
    /// actor has no context.
    pub fn set_context_session(&self, user_id: &str, session_id: &str) -> bool {
        self.with_context(user_id, |ctx| ctx.set_session(session_id))
    }

    /// Bump an actor's `last_activity`. Returns false if the actor has no
    /// context.
    pub fn record_context_activity(&self, user_id: &str) -> bool {
        self.with_context(user_id, SecurityContext::touch)
    }

    fn with_context(&self, user_id: &str, apply: impl FnOnce(&mut SecurityContext)) -> bool {
        match self.contexts.write().get_mut(user_id) {
            Some(context) => {
                apply(context);
                true
            }
            None => false,
        }
    }

    // ── Threat detection ──

    /// Register a threat pattern. Patterns are immutable once registered:
    /// a duplicate name is refused.
    pub fn register_pattern(&self, pattern: ThreatPattern) -> Result<(), RiskError> {
        let regex = compile_case_insensitive(&pattern.pattern, &pattern.name)?;
        let mut patterns = self.patterns.write();
        if patterns.iter().any(|p| p.pattern.name == pattern.name) {
            return Err(RiskError::DuplicatePattern(pattern.name));
        }
        info!(name = %pattern.name, "registered threat pattern");
        patterns.push(CompiledPattern { pattern, regex });
        Ok(())
    }

    /// Scan `text` against every registered, non-blocked threat pattern.
    /// Each match appends a ThreatEvent to the log. A HIGH-severity match
    /// trips the circuit breaker for its pattern: the pattern is skipped on
    /// all subsequent scans until `unblock_pattern` is called.
    pub fn detect_threats(&self, text: &str, source: &str) -> Vec<ThreatEvent> {
        let mut events = Vec::new();
        {
            let patterns = self.patterns.read();
            let mut blocked = self.blocked.write();
            for compiled in patterns.iter() {
                if blocked.contains(&compiled.pattern.name) {
                    continue;
                }
                if compiled.regex.is_match(text) {
                    events.push(ThreatEvent::new(&compiled.pattern, text, source));
                    if compiled.pattern.risk_level == RiskLevel::High {
                        warn!(
                            pattern = %compiled.pattern.name,
                            "high-severity threat matched; blocking pattern"
                        );
                        blocked.insert(compiled.pattern.name.clone());
                    }
                }
            }
        }
        self.threat_events.write().extend(events.iter().cloned());
        events
    }

    /// Reset the circuit breaker for one pattern so detection resumes.
    pub fn unblock_pattern(&self, name: &str) {
        if self.blocked.write().remove(name) {
            info!(pattern = %name, "unblocked threat pattern");
        }
    }

    /// Snapshot of the currently blocked pattern names.
    pub fn blocked_patterns(&self) -> HashSet<String> {
        self.blocked.read().clone()
    }

    /// Filtered snapshot of the threat-event log.
    pub fn threat_events(&self, filter: &ThreatEventFilter) -> Vec<ThreatEvent> {
        self.threat_events
            .read()
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect()
    }

    /// Drop every recorded threat event. The only mutation the event log
    /// permits besides append.
    pub fn clear_threat_events(&self) {
        self.threat_events.write().clear();
    }

    /// Aggregate counts over the full threat-event log.
    pub fn threat_statistics(&self) -> ThreatStatistics {
        let events = self.threat_events.read();
        let mut stats = ThreatStatistics {
            total_events: events.len(),
            blocked_patterns: self.blocked.read().len(),
            ..Default::default()
        };
        for event in events.iter() {
            match event.risk_level {
                RiskLevel::High => stats.high_risk_events += 1,
                RiskLevel::Medium => stats.medium_risk_events += 1,
                RiskLevel::Low => stats.low_risk_events += 1,
            }
            *stats
                .categories
                .entry(event.details.category.clone())
                .or_insert(0) += 1;
        }
        stats
    }

    // ── Audit ──

    /// Append an audit entry. HIGH-risk entries additionally emit a
    /// warning-level signal for the logging collaborator to pick up.
    pub fn log_audit(
        &self,
        user_id: impl Into<String>,
        action: impl Into<String>,
        details: Value,
        risk_level: RiskLevel,
        status: impl Into<String>,
    ) {
        let entry = AuditLogEntry {
            timestamp: chrono::Utc::now(),
            user_id: user_id.into(),
            action: action.into(),
            details,
            risk_level,
            status: status.into(),
        };
        if risk_level == RiskLevel::High && self.config.warn_on_high_risk {
            warn!(
                user_id = %entry.user_id,
                action = %entry.action,
                "high-risk operation audited"
            );
        }
        self.audit_log.write().push(entry);
    }

    /// Filtered snapshot of the audit log.
    pub fn audit_logs(&self, filter: &AuditLogFilter) -> Vec<AuditLogEntry> {
        self.audit_log
            .read()
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect()
    }

    // ── Scoring ──

    /// Additive risk heuristic in [0, 1], independent of the policy-based
    /// `evaluate_risk`:
    ///   +0.3 any string parameter containing a shell metacharacter
    ///   +0.2 action is file_write or file_delete
    ///   +0.4 action is execute_command
    ///   +0.2 action is network_request
    pub fn assess_risk(&self, action: &str, params: &Value) -> f64 {
        let mut score: f64 = 0.0;

        let injection_shaped = params
            .as_object()
            .map(|map| {
                map.values().any(|value| match value.as_str() {
                    Some(text) => {
                        let lowered = text.to_lowercase();
                        SHELL_METACHARACTERS.iter().any(|m| lowered.contains(*m))
                    }
                    None => false,
                })
            })
            .unwrap_or(false);
        if injection_shaped {
            score += 0.3;
        }

        match action {
            "file_write" | "file_delete" => score += 0.2,
            "execute_command" => score += 0.4,
            "network_request" => score += 0.2,
            _ => {}
        }

        score.min(1.0)
    }

    /// Whether a score from `assess_risk` crosses the configured threshold.
    pub fn exceeds_threshold(&self, score: f64) -> bool {
        score >= self.config.risk_threshold
    }
}

impl Default for RiskGate {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_case_insensitive(source: &str, owner: &str) -> Result<Regex, RiskError> {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .map_err(|err| RiskError::InvalidPattern {
            name: owner.to_string(),
            pattern: source.to_string(),
            reason: err.to_string(),
        })
}

/// The stock policies: file operations at MEDIUM, system commands at HIGH.
fn default_policies() -> Vec<SecurityPolicy> {
    vec![
        SecurityPolicy {
            name: "file_operation".to_string(),
            description: "File operation security policy".to_string(),
            risk_level: RiskLevel::Medium,
            required_permissions: vec!["file.read".to_string(), "file.write".to_string()],
            max_execution_time: 30,
            resource_limits: serde_json::json!({"max_file_size": 100 * 1024 * 1024})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            command_patterns: vec![
                r"rm\s+-rf\s+/".to_string(),
                r"mkfs\.".to_string(),
                r"dd\s+if=".to_string(),
                r">\s+/dev/sda".to_string(),
            ],
        },
        SecurityPolicy {
            name: "system_command".to_string(),
            description: "System command security policy".to_string(),
            risk_level: RiskLevel::High,
            required_permissions: vec!["system.execute".to_string()],
            max_execution_time: 60,
            resource_limits: serde_json::json!({"max_memory": 512 * 1024 * 1024})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            command_patterns: vec![
                r"sudo\s+".to_string(),
                r"chmod\s+777".to_string(),
                r"chown\s+root".to_string(),
                r"mkfs\.".to_string(),
                r"dd\s+if=".to_string(),
            ],
        },
    ]
}

/// The stock threat patterns with their severities and categories.
fn default_patterns() -> Vec<ThreatPattern> {
    vec![
        ThreatPattern {
            name: "dangerous_file_operation".to_string(),
            description: "Destructive file system operation".to_string(),
            pattern: r"(?:rm\s+-rf|mkfs\.|dd\s+if=)".to_string(),
            risk_level: RiskLevel::High,
            category: "file_system".to_string(),
            mitigation: "Block execution and record".to_string(),
        },
        ThreatPattern {
            name: "dangerous_system_command".to_string(),
            description: "Dangerous system command".to_string(),
            pattern: r"(?:sudo\s+|chmod\s+777|chown\s+root)".to_string(),
            risk_level: RiskLevel::High,
            category: "system".to_string(),
            mitigation: "Block execution and record".to_string(),
        },
        ThreatPattern {
            name: "suspicious_network_activity".to_string(),
            description: "Suspicious network activity".to_string(),
            pattern: r"(?:nc\s+-l|nmap|wget\s+http)".to_string(),
            risk_level: RiskLevel::Medium,
            category: "network".to_string(),
            mitigation: "Record and warn".to_string(),
        },
        ThreatPattern {
            name: "privilege_escalation".to_string(),
            description: "Privilege escalation attempt".to_string(),
            pattern: r"(?:sudo\s+su|sudo\s+bash|sudo\s+sh)".to_string(),
            risk_level: RiskLevel::High,
            category: "security".to_string(),
            mitigation: "Block execution and record".to_string(),
        },
    ]
}
