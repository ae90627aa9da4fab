// config.rs — TOML-backed configuration for the workflow subsystem.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/workflows")
}

/// Configuration for the workflow orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Directory holding one JSON record per workflow.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl WorkflowConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| WorkflowError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|err| WorkflowError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = WorkflowConfig::load(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data/workflows"));
    }

    #[test]
    fn parses_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("workflow.toml");
        std::fs::write(&path, "data_dir = \"/var/lib/warden/workflows\"\n").unwrap();

        let config = WorkflowConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/warden/workflows"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("workflow.toml");
        std::fs::write(&path, "data_dir = [not toml").unwrap();

        assert!(matches!(
            WorkflowConfig::load(&path),
            Err(WorkflowError::Config(_))
        ));
    }
}
