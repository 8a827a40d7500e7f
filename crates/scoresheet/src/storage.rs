//! Session persistence.
//!
//! A [`SessionSnapshot`] is written when recording ends and read back to
//! resume. Stores are best-effort: callers log failures and carry on with
//! the in-memory session.

use crate::history::PlyHistory;
use crate::undo::ReversibleAction;
use chrono::{DateTime, Utc};
use scoresheet_core::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when storing or loading a session.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Everything needed to resume a recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub history: PlyHistory,
    pub current_player: Color,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub actions: Vec<ReversibleAction>,
}

/// Where recorded sessions are kept.
pub trait SessionStore {
    fn store_session(&mut self, snapshot: &SessionSnapshot) -> Result<(), StorageError>;

    /// Returns `None` when nothing has been stored.
    fn load_session(&self) -> Result<Option<SessionSnapshot>, StorageError>;
}

/// Stores one session as a JSON file.
///
/// # Example
///
/// ```no_run
/// use scoresheet::storage::{JsonFileStore, SessionStore};
///
/// let store = JsonFileStore::new("data/session.json");
/// if let Some(snapshot) = store.load_session()? {
///     println!("{} plies recorded", snapshot.history.len());
/// }
/// # Ok::<(), scoresheet::storage::StorageError>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonFileStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileStore {
    fn store_session(&mut self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json)?;
        tracing::info!(path = %self.path.display(), plies = snapshot.history.len(), "session stored");
        Ok(())
    }

    fn load_session(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

/// Keeps the last stored session in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<SessionSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn store_session(&mut self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn load_session(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        Ok(self.snapshot.clone())
    }
}
