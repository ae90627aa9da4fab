// registry.rs — The capability registry and its timeout-bound executor.
//
// The registry owns the name → (descriptor, implementation) mapping and a
// dependency adjacency map used for presence checks. `execute` is the single
// invocation path:
//
//   1. Unknown name            → NotFound
//   2. Missing dependency      → DependencyUnsatisfied
//   3. Validator rejects       → ValidationFailed
//   4. Runs past the timeout   → Timeout (wait abandoned, not killed)
//   5. Err or panic from impl  → ExecutionFailed
//   6. Success                 → result stamped with wall-clock duration
//
// The registry performs no authorization; the risk gate does that in the
// caller layer before the registry is reached.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::capability::Capability;
use crate::descriptor::{CapabilityCategory, CapabilityDescriptor};
use crate::result::{CapabilityResult, FailureKind};

struct Registered {
    descriptor: CapabilityDescriptor,
    implementation: Arc<dyn Capability>,
}

/// The capability registry service.
pub struct CapabilityRegistry {
    capabilities: RwLock<HashMap<String, Registered>>,
    /// name → declared dependency names, for presence checks only.
    dependency_graph: RwLock<HashMap<String, HashSet<String>>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            capabilities: RwLock::new(HashMap::new()),
            dependency_graph: RwLock::new(HashMap::new()),
        }
    }

    /// Register a capability under its descriptor's name.
    ///
    /// A name collision overwrites the previous registration with a warning
    /// — never a merge. The descriptor's dependency names are recorded for
    /// later presence checks; they do not need to be registered yet.
    pub fn register(&self, descriptor: CapabilityDescriptor, implementation: Arc<dyn Capability>) {
        let name = descriptor.name.clone();
        let dependencies: HashSet<String> = descriptor.dependencies.iter().cloned().collect();

        let mut capabilities = self.capabilities.write();
        if capabilities.contains_key(&name) {
            warn!(name = %name, "capability already registered; overwriting");
        } else {
            info!(name = %name, version = %descriptor.version, "registered capability");
        }
        capabilities.insert(
            name.clone(),
            Registered {
                descriptor,
                implementation,
            },
        );
        self.dependency_graph.write().insert(name, dependencies);
    }

    /// The implementation registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities
            .read()
            .get(name)
            .map(|r| Arc::clone(&r.implementation))
    }

    /// The descriptor registered under `name`, if any.
    pub fn descriptor(&self, name: &str) -> Option<CapabilityDescriptor> {
        self.capabilities
            .read()
            .get(name)
            .map(|r| r.descriptor.clone())
    }

    /// All registered descriptors. Callers filter by risk level before
    /// exposing capabilities to an actor.
    pub fn list(&self) -> Vec<CapabilityDescriptor> {
        self.capabilities
            .read()
            .values()
            .map(|r| r.descriptor.clone())
            .collect()
    }

    /// Registered descriptors in one side-effect category.
    pub fn list_by_category(&self, category: CapabilityCategory) -> Vec<CapabilityDescriptor> {
        self.capabilities
            .read()
            .values()
            .filter(|r| r.descriptor.category == category)
            .map(|r| r.descriptor.clone())
            .collect()
    }

    /// True iff every dependency `name` declared resolves to a registered
    /// capability right now. Presence check only — no cycle detection and no
    /// ordering, because dependencies are expected to be leaves.
    pub fn check_dependencies(&self, name: &str) -> bool {
        let graph = self.dependency_graph.read();
        let Some(dependencies) = graph.get(name) else {
            return false;
        };
        let capabilities = self.capabilities.read();
        dependencies.iter().all(|dep| capabilities.contains_key(dep))
    }

    /// The dependency names `name` declares (empty if unregistered).
    pub fn dependencies_of(&self, name: &str) -> HashSet<String> {
        self.dependency_graph
            .read()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// The names of registered capabilities that declare `name` as a
    /// dependency.
    pub fn dependents_of(&self, name: &str) -> HashSet<String> {
        self.dependency_graph
            .read()
            .iter()
            .filter(|(_, deps)| deps.contains(name))
            .map(|(dependent, _)| dependent.clone())
            .collect()
    }

    /// Execute a capability under its descriptor's timeout.
    ///
    /// Always returns a result — implementation errors and panics are
    /// converted, never propagated. On timeout only the wait is abandoned;
    /// the spawned work is not forcibly terminated, so side effects may
    /// still land (known limitation).
    pub async fn execute(&self, name: &str, params: serde_json::Value) -> CapabilityResult {
        let (descriptor, implementation) = {
            let capabilities = self.capabilities.read();
            match capabilities.get(name) {
                Some(registered) => (
                    registered.descriptor.clone(),
                    Arc::clone(&registered.implementation),
                ),
                None => {
                    return CapabilityResult::failure(
                        FailureKind::NotFound,
                        format!("capability '{name}' is not registered"),
                    )
                }
            }
        };

        if !self.check_dependencies(name) {
            return CapabilityResult::failure(
                FailureKind::DependencyUnsatisfied,
                format!("capability '{name}' has unresolved dependencies"),
            );
        }

        if !implementation.validate_params(&params) {
            return CapabilityResult::failure(
                FailureKind::ValidationFailed,
                format!("capability '{name}' rejected the parameters"),
            );
        }

        let started = Instant::now();
        // Spawning isolates panics: a panicking implementation surfaces as a
        // JoinError here instead of unwinding through the registry.
        let handle = tokio::spawn(async move { implementation.execute(params).await });

        match tokio::time::timeout(Duration::from_secs(descriptor.timeout_secs), handle).await {
            Err(_elapsed) => {
                warn!(name = %name, timeout_secs = descriptor.timeout_secs, "capability timed out");
                let mut result = CapabilityResult::failure(
                    FailureKind::Timeout,
                    format!(
                        "capability '{name}' exceeded its {}s timeout",
                        descriptor.timeout_secs
                    ),
                );
                result.execution_time = started.elapsed().as_secs_f64();
                result
            }
            Ok(Err(join_err)) => {
                let mut result = CapabilityResult::failure(
                    FailureKind::ExecutionFailed,
                    format!("capability '{name}' panicked: {join_err}"),
                );
                result.execution_time = started.elapsed().as_secs_f64();
                result
            }
            Ok(Ok(Err(err))) => {
                let mut result = CapabilityResult::failure(
                    FailureKind::ExecutionFailed,
                    err.to_string(),
                );
                result.execution_time = started.elapsed().as_secs_f64();
                result
            }
            Ok(Ok(Ok(mut result))) => {
                result.execution_time = started.elapsed().as_secs_f64();
                result
            }
        }
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use warden_types::RiskLevel;

    struct Echo;

    #[async_trait]
    impl Capability for Echo {
        async fn execute(&self, params: Value) -> anyhow::Result<CapabilityResult> {
            Ok(CapabilityResult::ok(params.to_string()))
        }
    }

    struct Sleeper {
        secs: u64,
    }

    #[async_trait]
    impl Capability for Sleeper {
        async fn execute(&self, _params: Value) -> anyhow::Result<CapabilityResult> {
            tokio::time::sleep(Duration::from_secs(self.secs)).await;
            Ok(CapabilityResult::ok("woke up"))
        }
    }

    struct Failing;

    #[async_trait]
    impl Capability for Failing {
        async fn execute(&self, _params: Value) -> anyhow::Result<CapabilityResult> {
            anyhow::bail!("disk on fire")
        }
    }

    struct Panicking;

    #[async_trait]
    impl Capability for Panicking {
        async fn execute(&self, _params: Value) -> anyhow::Result<CapabilityResult> {
            panic!("implementation bug")
        }
    }

    struct Strict;

    #[async_trait]
    impl Capability for Strict {
        async fn execute(&self, _params: Value) -> anyhow::Result<CapabilityResult> {
            Ok(CapabilityResult::ok("ran"))
        }

        fn validate_params(&self, params: &Value) -> bool {
            params.get("path").is_some()
        }
    }

    fn descriptor(name: &str) -> CapabilityDescriptor {
        CapabilityDescriptor::new(name, format!("{name} capability"), CapabilityCategory::File)
    }

    #[tokio::test]
    async fn register_and_execute_success() {
        let registry = CapabilityRegistry::new();
        registry.register(descriptor("echo"), Arc::new(Echo));

        let result = registry.execute("echo", json!({"msg": "hi"})).await;
        assert!(result.success);
        assert!(result.output.unwrap().contains("hi"));
        assert!(result.execution_time >= 0.0);
    }

    #[tokio::test]
    async fn unknown_capability_is_not_found() {
        let registry = CapabilityRegistry::new();
        let result = registry.execute("ghost", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.failure_kind, Some(FailureKind::NotFound));
    }

    #[test]
    fn reregistering_overwrites_descriptor() {
        let registry = CapabilityRegistry::new();
        registry.register(descriptor("echo"), Arc::new(Echo));
        registry.register(
            descriptor("echo").with_risk_level(RiskLevel::High),
            Arc::new(Echo),
        );

        // get returns the most recent registration.
        assert_eq!(registry.list().len(), 1);
        assert_eq!(
            registry.descriptor("echo").unwrap().risk_level,
            RiskLevel::High
        );
    }

    #[test]
    fn dependency_presence_check() {
        let registry = CapabilityRegistry::new();
        registry.register(
            descriptor("composite").with_dependencies(vec!["leaf".to_string()]),
            Arc::new(Echo),
        );

        // Dependency may be declared before it exists...
        assert!(!registry.check_dependencies("composite"));

        // ...and resolves once registered.
        registry.register(descriptor("leaf"), Arc::new(Echo));
        assert!(registry.check_dependencies("composite"));

        // Unregistered names fail the check outright.
        assert!(!registry.check_dependencies("ghost"));
    }

    #[tokio::test]
    async fn execute_refused_when_dependency_missing() {
        let registry = CapabilityRegistry::new();
        registry.register(
            descriptor("composite").with_dependencies(vec!["leaf".to_string()]),
            Arc::new(Echo),
        );

        let result = registry.execute("composite", json!({})).await;
        assert!(!result.success);
        assert_eq!(
            result.failure_kind,
            Some(FailureKind::DependencyUnsatisfied)
        );
    }

    #[tokio::test]
    async fn validator_rejection_fails_validation() {
        let registry = CapabilityRegistry::new();
        registry.register(descriptor("strict"), Arc::new(Strict));

        let rejected = registry.execute("strict", json!({})).await;
        assert_eq!(rejected.failure_kind, Some(FailureKind::ValidationFailed));

        let accepted = registry.execute("strict", json!({"path": "/tmp/a"})).await;
        assert!(accepted.success);
    }

    // Paused clock: the 1s timeout elapses instantly and deterministically.
    #[tokio::test(start_paused = true)]
    async fn slow_capability_times_out() {
        let registry = CapabilityRegistry::new();
        registry.register(
            descriptor("slow").with_timeout_secs(1),
            Arc::new(Sleeper { secs: 30 }),
        );

        let result = registry.execute("slow", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.failure_kind, Some(FailureKind::Timeout));
        // Measured duration is approximately the timeout bound.
        assert!(result.execution_time >= 0.9 && result.execution_time < 2.0);
    }

    #[tokio::test]
    async fn implementation_error_becomes_execution_failed() {
        let registry = CapabilityRegistry::new();
        registry.register(descriptor("failing"), Arc::new(Failing));

        let result = registry.execute("failing", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.failure_kind, Some(FailureKind::ExecutionFailed));
        assert!(result.error.unwrap().contains("disk on fire"));
    }

    #[tokio::test]
    async fn implementation_panic_becomes_execution_failed() {
        let registry = CapabilityRegistry::new();
        registry.register(descriptor("panicking"), Arc::new(Panicking));

        let result = registry.execute("panicking", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.failure_kind, Some(FailureKind::ExecutionFailed));
    }

    #[test]
    fn list_by_category_filters() {
        let registry = CapabilityRegistry::new();
        registry.register(descriptor("file_read"), Arc::new(Echo));
        registry.register(
            CapabilityDescriptor::new("shell", "run", CapabilityCategory::System),
            Arc::new(Echo),
        );

        assert_eq!(registry.list().len(), 2);
        let files = registry.list_by_category(CapabilityCategory::File);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "file_read");
    }

    #[test]
    fn dependency_introspection() {
        let registry = CapabilityRegistry::new();
        registry.register(descriptor("leaf"), Arc::new(Echo));
        registry.register(
            descriptor("composite").with_dependencies(vec!["leaf".to_string()]),
            Arc::new(Echo),
        );

        assert!(registry.dependencies_of("composite").contains("leaf"));
        assert!(registry.dependencies_of("leaf").is_empty());
        assert!(registry.dependents_of("leaf").contains("composite"));
        assert!(registry.dependents_of("composite").is_empty());
    }
}
