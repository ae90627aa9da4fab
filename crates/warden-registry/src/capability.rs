// capability.rs — The executable contract a capability implements.
//
// The registry holds implementations as `Arc<dyn Capability>`. The trait is
// deliberately small: an async execute over JSON parameters, and an optional
// parameter validator that defaults to accept-all. Authorization is not the
// implementation's concern — the risk gate handles that before the registry
// is ever reached.

use async_trait::async_trait;
use serde_json::Value;

use crate::result::CapabilityResult;

/// An executable capability implementation.
///
/// Implementations may return `Err` for internal failures; the registry
/// converts any `Err` (and any panic) into a structured failure result, so
/// nothing an implementation does can escape the execute boundary.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Run the capability with the given parameters.
    async fn execute(&self, params: Value) -> anyhow::Result<CapabilityResult>;

    /// Validate parameters before execution. Default: accept everything.
    fn validate_params(&self, _params: &Value) -> bool {
        true
    }
}
