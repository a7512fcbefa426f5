//! Durable storage for the draw queue between process runs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::types::GestureId;
use crate::{RecorderError, Result};

/// Serialized draw queue and last session batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct PersistedQueueState {
    /// Remaining draw order, front first
    pub shuffled_queue: Vec<GestureId>,
    /// Batch of the last session
    pub gesture_mini_batch: Vec<GestureId>,
}

impl PersistedQueueState {
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| RecorderError::parse("PersistedQueueState deserialization", e))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| RecorderError::parse("PersistedQueueState serialization", e))
    }
}

/// Side-channel store for [`PersistedQueueState`].
///
/// `load` returns `Ok(None)` when nothing has been stored yet; that is the
/// first-run condition, not an error.
pub trait QueueStateStore: Send {
    fn load(&self) -> Result<Option<PersistedQueueState>>;

    fn save(&self, state: &PersistedQueueState) -> Result<()>;
}

/// YAML file store.
#[derive(Debug, Clone)]
pub struct FileQueueStore {
    path: PathBuf,
}

impl FileQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueueStateStore for FileQueueStore {
    fn load(&self) -> Result<Option<PersistedQueueState>> {
        let yaml = match std::fs::read_to_string(&self.path) {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No queue state at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(RecorderError::persistence(&self.path, e)),
        };

        if yaml.trim().is_empty() {
            return Ok(None);
        }
        PersistedQueueState::parse(&yaml).map(Some)
    }

    fn save(&self, state: &PersistedQueueState) -> Result<()> {
        let yaml = state.to_yaml()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RecorderError::persistence(parent, e))?;
        }

        // The target file is only ever replaced by rename, never written in place.
        let tmp = self.path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml).map_err(|e| RecorderError::persistence(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| RecorderError::persistence(&self.path, e))?;

        debug!(
            queue = state.shuffled_queue.len(),
            batch = state.gesture_mini_batch.len(),
            "Saved queue state to {}",
            self.path.display()
        );
        Ok(())
    }
}

/// In-process store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueueStore {
    slot: Arc<Mutex<Option<PersistedQueueState>>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<PersistedQueueState> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

impl QueueStateStore for MemoryQueueStore {
    fn load(&self) -> Result<Option<PersistedQueueState>> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &PersistedQueueState) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(state.clone());
        Ok(())
    }
}
