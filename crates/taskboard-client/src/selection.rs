use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Last-selected workspace id, mirrored to disk so the choice survives a
/// restart. An empty id records "nothing selected".
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SelectionState {
    workspace_id: String,
}

#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    /// Store backed by the default per-user config directory.
    pub fn open() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("taskboard");

        fs::create_dir_all(&config_dir)
            .context("Could not create config directory")?;

        Ok(Self {
            path: config_dir.join("workspace.json"),
        })
    }

    /// Store backed by an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted selection; missing or cleared state reads as None.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .context("Could not read workspace selection file")?;

        let state: SelectionState = serde_json::from_str(&contents)
            .context("Could not parse workspace selection file")?;

        if state.workspace_id.is_empty() {
            return Ok(None);
        }

        Ok(Some(state.workspace_id))
    }

    /// Persist the selection. Pass an empty id to record "no selection".
    pub fn save(&self, workspace_id: &str) -> Result<()> {
        let state = SelectionState {
            workspace_id: workspace_id.to_string(),
        };
        let contents = serde_json::to_string_pretty(&state)
            .context("Could not serialize workspace selection")?;

        fs::write(&self.path, contents)
            .context("Could not write workspace selection file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = SelectionStore::at(dir.path().join("workspace.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let store = SelectionStore::at(dir.path().join("workspace.json"));

        store.save("org_42").unwrap();
        assert_eq!(store.load().unwrap(), Some("org_42".to_string()));

        store.save("org_7").unwrap();
        assert_eq!(store.load().unwrap(), Some("org_7".to_string()));
    }

    #[test]
    fn test_empty_id_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = SelectionStore::at(dir.path().join("workspace.json"));

        store.save("org_42").unwrap();
        store.save("").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
