//! Durable storage for the position ledger

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::types::PositionState;
use crate::common::errors::{AgentError, Result};
use crate::common::traits::PositionStore;

/// Stores the ledger as pretty-printed JSON in a single file
///
/// Writes go to a temporary sibling that is renamed over the target, so a
/// crash mid-write never leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "position.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PositionStore for JsonFileStore {
    fn load(&self) -> Result<Option<PositionState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&contents).map_err(|e| {
            AgentError::Persistence(format!("{}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), "Loaded position state");
        Ok(Some(state))
    }

    fn save(&self, state: &PositionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), trades = state.trades.len(), "Saved position state");
        Ok(())
    }
}

/// Keeps the ledger in memory only
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<PositionState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state
    pub fn with_state(state: PositionState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl PositionStore for MemoryStore {
    fn load(&self) -> Result<Option<PositionState>> {
        let guard = self
            .state
            .lock()
            .map_err(|e| AgentError::Persistence(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, state: &PositionState) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| AgentError::Persistence(e.to_string()))?;
        *guard = Some(state.clone());
        Ok(())
    }
}
