//! Durable key-value collaborator for gateway preferences.
//!
//! The gateway only needs a tiny amount of durable state (the active
//! provider). It must keep working when no store is configured or when the
//! store fails, so every caller treats store errors as non-fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::{Result, SwitchyardError};

/// Key under which the active provider id is persisted.
pub const ACTIVE_PROVIDER_KEY: &str = "active_provider";

/// Async string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never written.
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Write (or overwrite) a value.
    async fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// The whole file is rewritten on every save; it is meant for a handful of
/// preference keys, not bulk data.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/switchyard/state.json`, or `.switchyard/state.json`
    /// when the platform has no config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".switchyard"))
            .join("switchyard")
            .join("state.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(SwitchyardError::Store(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SwitchyardError::Store(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let content = serde_json::to_string_pretty(&values)?;
        tokio::fs::write(&self.path, content).await.map_err(|e| {
            SwitchyardError::Store(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}
