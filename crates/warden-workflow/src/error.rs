// error.rs — Error types for the workflow subsystem.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The requested workflow was not found.
    #[error("workflow not found: {0}")]
    NotFound(Uuid),

    /// A step index fell outside `[0, len(steps))`.
    #[error("step index {index} out of range for workflow {workflow_id} with {len} steps")]
    StepOutOfRange {
        workflow_id: Uuid,
        index: usize,
        len: usize,
    },

    /// A step status change violated the step state machine.
    #[error("invalid step transition from {from} to {to} for workflow {workflow_id} step {index}")]
    InvalidTransition {
        workflow_id: Uuid,
        index: usize,
        from: String,
        to: String,
    },

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize workflow data.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Workflow configuration failed to parse.
    #[error("configuration error: {0}")]
    Config(String),
}
