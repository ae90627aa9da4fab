// orchestrator.rs — WorkflowOrchestrator: the in-memory workflow map plus
// its persistence and rollback wiring.
//
// All mutations happen under one lock, so concurrent status updates for the
// same workflow cannot interleave their persistence writes. A persistence
// failure during creation or a status update is logged and the in-memory
// state still advances; the memory image is authoritative within a process
// lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use warden_registry::CapabilityCategory;

use crate::error::WorkflowError;
use crate::rollback::RollbackStrategy;
use crate::store::WorkflowStore;
use crate::workflow::{HistoryEntry, StepStatus, Workflow, WorkflowStatus, WorkflowStep};

/// Creates, tracks, persists, and rolls back workflows.
pub struct WorkflowOrchestrator {
    workflows: Mutex<HashMap<Uuid, Workflow>>,
    store: WorkflowStore,
    rollback_strategies: Mutex<HashMap<CapabilityCategory, Arc<dyn RollbackStrategy>>>,
}

impl WorkflowOrchestrator {
    /// Create an orchestrator backed by the given store, loading every
    /// persisted workflow into memory up front.
    pub fn new(store: WorkflowStore) -> Result<Self, WorkflowError> {
        let mut workflows = HashMap::new();
        for workflow in store.load_all()? {
            workflows.insert(workflow.id, workflow);
        }
        info!(count = workflows.len(), "loaded persisted workflows");
        Ok(Self {
            workflows: Mutex::new(workflows),
            store,
            rollback_strategies: Mutex::new(HashMap::new()),
        })
    }

    /// Register the rollback strategy for one capability category,
    /// replacing any previous strategy for that category.
    pub fn register_rollback_strategy(&self, strategy: Arc<dyn RollbackStrategy>) {
        let category = strategy.category();
        self.rollback_strategies.lock().insert(category, strategy);
    }

    /// Create a new workflow and return the full record. Steps start
    /// Pending. The record is persisted immediately, but a failed durable
    /// write does not abort creation: the workflow still enters memory and
    /// the failure is logged, same as every other status update.
    pub fn create_workflow(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        steps: Vec<WorkflowStep>,
    ) -> Workflow {
        let workflow = Workflow::new(name, description, steps);
        self.persist(&workflow);
        self.workflows
            .lock()
            .insert(workflow.id, workflow.clone());
        info!(workflow_id = %workflow.id, "created workflow");
        workflow
    }

    /// Snapshot of one workflow.
    pub fn workflow(&self, id: Uuid) -> Option<Workflow> {
        self.workflows.lock().get(&id).cloned()
    }

    /// Snapshot of every tracked workflow.
    pub fn list_workflows(&self) -> Vec<Workflow> {
        self.workflows.lock().values().cloned().collect()
    }

    /// Remove a workflow from memory and disk. Returns false if unknown.
    pub fn delete_workflow(&self, id: Uuid) -> Result<bool, WorkflowError> {
        let removed = self.workflows.lock().remove(&id).is_some();
        if removed {
            self.store.delete(id)?;
            info!(workflow_id = %id, "deleted workflow");
        }
        Ok(removed)
    }

    /// The append-only history of one workflow, empty if unknown.
    pub fn workflow_history(&self, id: Uuid) -> Vec<HistoryEntry> {
        self.workflows
            .lock()
            .get(&id)
            .map(|wf| wf.history.clone())
            .unwrap_or_default()
    }

    /// Set the workflow-level status.
    pub fn update_workflow_status(
        &self,
        id: Uuid,
        status: WorkflowStatus,
    ) -> Result<(), WorkflowError> {
        let mut workflows = self.workflows.lock();
        let workflow = workflows.get_mut(&id).ok_or(WorkflowError::NotFound(id))?;
        workflow.status = status;
        workflow.updated_at = Utc::now();
        self.persist(workflow);
        Ok(())
    }

    /// Advance one step through its state machine, recording the outcome.
    ///
    /// Entering Running stamps `start_time`; reaching Completed or Failed
    /// stamps `end_time`. Every accepted transition appends one history
    /// entry. The updated record is persisted; a persistence failure is
    /// logged and the in-memory update stands.
    pub fn update_step_status(
        &self,
        id: Uuid,
        index: usize,
        status: StepStatus,
        result: Option<Value>,
        error: Option<String>,
        rollback_data: Option<Value>,
    ) -> Result<(), WorkflowError> {
        let mut workflows = self.workflows.lock();
        let workflow = workflows.get_mut(&id).ok_or(WorkflowError::NotFound(id))?;

        let len = workflow.steps.len();
        let step = workflow
            .steps
            .get_mut(index)
            .ok_or(WorkflowError::StepOutOfRange {
                workflow_id: id,
                index,
                len,
            })?;

        if !step.status.can_transition_to(status) {
            return Err(WorkflowError::InvalidTransition {
                workflow_id: id,
                index,
                from: step.status.to_string(),
                to: status.to_string(),
            });
        }

        let now = Utc::now();
        step.status = status;
        match status {
            StepStatus::Running => step.start_time = Some(now),
            StepStatus::Completed | StepStatus::Failed => step.end_time = Some(now),
            _ => {}
        }
        if let Some(result) = result.clone() {
            step.result = Some(result);
        }
        if let Some(error) = error.clone() {
            step.error = Some(error);
        }
        if let Some(rollback_data) = rollback_data {
            step.rollback_data = Some(rollback_data);
        }

        workflow.history.push(HistoryEntry {
            timestamp: now,
            step_index: index,
            status,
            result,
            error,
        });
        workflow.updated_at = now;
        self.persist(workflow);
        Ok(())
    }

    /// Roll back one step, returning true only if its side effects were
    /// undone.
    ///
    /// Requires the step to have recorded `rollback_data` and a category
    /// with a registered strategy, and to be in a terminal state. On
    /// success the step becomes RolledBack and the workflow status becomes
    /// RolledBack; on any failure nothing changes and false is returned.
    pub fn rollback_workflow(&self, id: Uuid, index: usize) -> Result<bool, WorkflowError> {
        let mut workflows = self.workflows.lock();
        let workflow = workflows.get_mut(&id).ok_or(WorkflowError::NotFound(id))?;

        let len = workflow.steps.len();
        let step = workflow
            .steps
            .get_mut(index)
            .ok_or(WorkflowError::StepOutOfRange {
                workflow_id: id,
                index,
                len,
            })?;

        if !matches!(step.status, StepStatus::Completed | StepStatus::Failed) {
            warn!(workflow_id = %id, index, status = %step.status, "step not in a rollbackable state");
            return Ok(false);
        }
        let Some(rollback_data) = step.rollback_data.clone() else {
            warn!(workflow_id = %id, index, "step has no rollback data");
            return Ok(false);
        };
        let Some(category) = step.category else {
            warn!(workflow_id = %id, index, "step has no capability category");
            return Ok(false);
        };
        let Some(strategy) = self.rollback_strategies.lock().get(&category).cloned() else {
            warn!(workflow_id = %id, index, %category, "no rollback strategy registered");
            return Ok(false);
        };

        if let Err(err) = strategy.rollback(&rollback_data) {
            error!(workflow_id = %id, index, %category, %err, "rollback strategy failed");
            return Ok(false);
        }

        let now = Utc::now();
        step.status = StepStatus::RolledBack;
        workflow.status = WorkflowStatus::RolledBack;
        workflow.history.push(HistoryEntry {
            timestamp: now,
            step_index: index,
            status: StepStatus::RolledBack,
            result: None,
            error: None,
        });
        workflow.updated_at = now;
        self.persist(workflow);
        info!(workflow_id = %id, index, "rolled back step");
        Ok(true)
    }

    /// Record the capability category of one step, so a later rollback can
    /// pick the matching strategy. Called by the caller layer after it has
    /// resolved the step's capability in the registry.
    pub fn set_step_category(
        &self,
        id: Uuid,
        index: usize,
        category: CapabilityCategory,
    ) -> Result<(), WorkflowError> {
        let mut workflows = self.workflows.lock();
        let workflow = workflows.get_mut(&id).ok_or(WorkflowError::NotFound(id))?;
        let len = workflow.steps.len();
        let step = workflow
            .steps
            .get_mut(index)
            .ok_or(WorkflowError::StepOutOfRange {
                workflow_id: id,
                index,
                len,
            })?;
        step.category = Some(category);
        workflow.updated_at = Utc::now();
        self.persist(workflow);
        Ok(())
    }

    fn persist(&self, workflow: &Workflow) {
        if let Err(err) = self.store.save(workflow) {
            error!(workflow_id = %workflow.id, %err, "failed to persist workflow update");
        }
    }
}
