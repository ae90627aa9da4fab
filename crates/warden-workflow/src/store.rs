// store.rs — WorkflowStore: one JSON file per workflow id.
//
// Each workflow is persisted as `<store_dir>/<id>.json`, pretty-printed so
// the records are easy to inspect manually. Every save is a full-record
// rewrite — no incremental updates.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::workflow::Workflow;

/// Persistent store for workflow records.
pub struct WorkflowStore {
    store_dir: PathBuf,
}

impl WorkflowStore {
    /// Create a store backed by the given directory, creating it if needed.
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let store_dir = store_dir.as_ref().to_path_buf();
        fs::create_dir_all(&store_dir).map_err(|source| WorkflowError::Io {
            path: store_dir.display().to_string(),
            source,
        })?;
        Ok(Self { store_dir })
    }

    /// Save a workflow (creates or overwrites the whole record).
    pub fn save(&self, workflow: &Workflow) -> Result<(), WorkflowError> {
        let path = self.record_file(workflow.id);
        let json = serde_json::to_string_pretty(workflow)?;
        fs::write(&path, json).map_err(|source| WorkflowError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Load one workflow by id.
    pub fn load(&self, id: Uuid) -> Result<Option<Workflow>, WorkflowError> {
        let path = self.record_file(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| WorkflowError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Load every record in the store directory. A record that fails to
    /// parse is logged and skipped — a corrupt file must not abort startup.
    pub fn load_all(&self) -> Result<Vec<Workflow>, WorkflowError> {
        let mut workflows = Vec::new();

        let entries = fs::read_dir(&self.store_dir).map_err(|source| WorkflowError::Io {
            path: self.store_dir.display().to_string(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| WorkflowError::Io {
                path: self.store_dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable workflow record");
                    continue;
                }
            };
            match serde_json::from_str::<Workflow>(&json) {
                Ok(workflow) => workflows.push(workflow),
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unparseable workflow record");
                }
            }
        }

        Ok(workflows)
    }

    /// Delete a workflow record. Returns false if no record existed.
    pub fn delete(&self, id: Uuid) -> Result<bool, WorkflowError> {
        let path = self.record_file(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|source| WorkflowError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(true)
    }

    fn record_file(&self, id: Uuid) -> PathBuf {
        self.store_dir.join(format!("{id}.json"))
    }
}
