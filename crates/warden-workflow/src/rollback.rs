// rollback.rs — Rollback strategies, keyed by capability category.
//
// A strategy knows how to undo the side effects of one category of
// capability (restore a file from its saved copy, revert a code edit, and
// so on). The orchestrator picks the strategy by the step's recorded
// category and hands it the step's rollback_data.

use serde_json::Value;

use warden_registry::CapabilityCategory;

/// Undoes the side effects of a completed or failed step.
pub trait RollbackStrategy: Send + Sync {
    /// The category of capability this strategy can undo.
    fn category(&self) -> CapabilityCategory;

    /// Undo one step given the opaque data recorded when it ran.
    fn rollback(&self, rollback_data: &Value) -> anyhow::Result<()>;
}
