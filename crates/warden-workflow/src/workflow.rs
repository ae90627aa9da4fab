// workflow.rs — The durable workflow record and its state machines.
//
// A Workflow owns an ordered list of steps, each ultimately wrapping one
// capability invocation performed by the caller layer. The step state machine
// is strict:
//
//   Pending → Running → {Completed | Failed}
//   {Completed | Failed} → RolledBack   (only via rollback_workflow)
//
// `history` is an append-only event log: one entry per step-status change,
// never edited.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use warden_registry::CapabilityCategory;

/// Lifecycle state of a single step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    RolledBack,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Running => write!(f, "running"),
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::RolledBack => write!(f, "rolled_back"),
        }
    }
}

impl StepStatus {
    /// Valid transitions for `update_step_status`. RolledBack is reachable
    /// only through the rollback path, never through a status update.
    pub fn can_transition_to(&self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (StepStatus::Pending, StepStatus::Running)
                | (StepStatus::Running, StepStatus::Completed)
                | (StepStatus::Running, StepStatus::Failed)
        )
    }
}

/// Lifecycle state of the workflow as a whole.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
    RolledBack,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Pending => write!(f, "pending"),
            WorkflowStatus::Running => write!(f, "running"),
            WorkflowStatus::Completed => write!(f, "completed"),
            WorkflowStatus::Failed => write!(f, "failed"),
            WorkflowStatus::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// One step of a workflow — wraps a single capability invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Name of the capability this step invokes.
    pub tool_name: String,

    /// Parameters passed to the capability.
    pub parameters: Value,

    /// Current lifecycle state.
    pub status: StepStatus,

    /// Execution result, recorded by the caller after the invocation.
    pub result: Option<Value>,

    /// Error text if the step failed.
    pub error: Option<String>,

    /// Stamped when the step enters Running.
    pub start_time: Option<DateTime<Utc>>,

    /// Stamped when the step reaches Completed or Failed.
    pub end_time: Option<DateTime<Utc>>,

    /// Opaque data a rollback strategy needs to undo this step. Absent
    /// means the step cannot be rolled back.
    pub rollback_data: Option<Value>,

    /// The capability's side-effect category, recorded by the caller so the
    /// orchestrator can pick the matching rollback strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CapabilityCategory>,
}

impl WorkflowStep {
    /// Create a pending step for one capability invocation.
    pub fn new(tool_name: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters,
            status: StepStatus::Pending,
            result: None,
            error: None,
            start_time: None,
            end_time: None,
            rollback_data: None,
            category: None,
        }
    }
}

/// One entry in a workflow's append-only history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub step_index: usize,
    pub status: StepStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
}

/// A durable, ordered multi-step execution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier. A UUID, not a counter — counters collide after a
    /// restart with partial persistence.
    pub id: Uuid,

    /// Human-readable name.
    pub name: String,

    /// What this workflow accomplishes.
    pub description: String,

    /// The ordered steps. Step indices address into this list.
    pub steps: Vec<WorkflowStep>,

    /// Workflow-level status.
    pub status: WorkflowStatus,

    /// When the workflow was created.
    pub created_at: DateTime<Utc>,

    /// When the workflow was last updated.
    pub updated_at: DateTime<Utc>,

    /// Free-form caller metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Append-only log of step-status changes.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Workflow {
    /// Create a new workflow with every step reset to Pending.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        mut steps: Vec<WorkflowStep>,
    ) -> Self {
        for step in &mut steps {
            step.status = StepStatus::Pending;
        }
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            steps,
            status: WorkflowStatus::Pending,
            created_at: now,
            updated_at: now,
            metadata: Map::new(),
            history: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_workflow_resets_steps_to_pending() {
        let mut step = WorkflowStep::new("file_read", json!({"path": "/tmp/a"}));
        step.status = StepStatus::Completed;

        let wf = Workflow::new("test", "test workflow", vec![step]);
        assert_eq!(wf.status, WorkflowStatus::Pending);
        assert_eq!(wf.steps[0].status, StepStatus::Pending);
        assert!(wf.history.is_empty());
    }

    #[test]
    fn workflow_ids_are_unique() {
        let a = Workflow::new("a", "", vec![]);
        let b = Workflow::new("b", "", vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn step_state_machine() {
        assert!(StepStatus::Pending.can_transition_to(StepStatus::Running));
        assert!(StepStatus::Running.can_transition_to(StepStatus::Completed));
        assert!(StepStatus::Running.can_transition_to(StepStatus::Failed));

        // No skipping, no reversing, no direct rollback.
        assert!(!StepStatus::Pending.can_transition_to(StepStatus::Completed));
        assert!(!StepStatus::Completed.can_transition_to(StepStatus::Running));
        assert!(!StepStatus::Completed.can_transition_to(StepStatus::RolledBack));
        assert!(!StepStatus::Failed.can_transition_to(StepStatus::RolledBack));
    }

    #[test]
    fn serialization_round_trip() {
        let wf = Workflow::new(
            "deploy",
            "deploy the thing",
            vec![WorkflowStep::new("shell", json!({"cmd": "make"}))],
        );
        let json = serde_json::to_string_pretty(&wf).unwrap();
        let restored: Workflow = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id, wf.id);
        assert_eq!(restored.steps.len(), 1);
        assert_eq!(restored.steps[0].status, StepStatus::Pending);
    }

    #[test]
    fn step_category_omitted_when_none() {
        let step = WorkflowStep::new("file_read", json!({}));
        let json = serde_json::to_string(&step).unwrap();
        assert!(!json.contains("category"));
    }
}
