//! # warden-workflow
//!
//! Durable multi-step workflow orchestration for Warden.
//!
//! The [`WorkflowOrchestrator`] tracks [`Workflow`] records in memory and
//! mirrors every accepted mutation to a per-record JSON store. Step status
//! changes are validated against a strict state machine and logged to an
//! append-only history; completed or failed steps that recorded rollback
//! data can be undone through a [`RollbackStrategy`] registered for their
//! capability category.
//!
//! Persistence failures during status updates never fail the update: the
//! in-memory image advances and the failure is logged.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod rollback;
pub mod store;
pub mod workflow;

pub use config::WorkflowConfig;
pub use error::WorkflowError;
pub use orchestrator::WorkflowOrchestrator;
pub use rollback::RollbackStrategy;
pub use store::WorkflowStore;
pub use workflow::{HistoryEntry, StepStatus, Workflow, WorkflowStatus, WorkflowStep};
